//! # Fivetran Operator
//!
//! Kubernetes operator that manages Fivetran connectors declared as
//! `FivetranConnector` resources.
//!
//! 1. **Watches** `FivetranConnector` resources (all namespaces or `WATCH_NAMESPACE`)
//! 2. **Resolves** `vault:<path>#<key>` references from HashiCorp Vault
//! 3. **Creates, adopts and updates** connectors through the Fivetran REST API
//! 4. **Applies** the declared schema/table/column selection and verifies it
//! 5. **Reports** progress on the `ConnectorReady`, `SetupTestReady` and `SchemaReady` conditions
//!
//! Metrics and health probes are served on `METRICS_PORT` (`/metrics`,
//! `/healthz`, `/readyz`).

use anyhow::Result;
use fivetran_operator::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.connectors, init.reconciler, init.server_state).await
}
