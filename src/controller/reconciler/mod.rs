//! # Reconciler
//!
//! Reconciliation engine for `FivetranConnector` resources.
//!
//! A pass compares the resource with the state last applied to Fivetran and
//! only touches what changed:
//!
//! - resolves Vault references in `config` and `auth`
//! - creates, adopts or updates the connector and runs its setup tests
//! - applies the declared schema configuration and verifies it, with one
//!   reload-and-retry cycle on mismatch
//! - records every step on the `ConnectorReady`, `SetupTestReady` and
//!   `SchemaReady` conditions
//!
//! The Kubernetes API, Fivetran and Vault are reached through the
//! [`ResourceStore`], [`FivetranApi`](crate::fivetran::FivetranApi) and
//! [`SecretStoreProvider`](crate::vault::SecretStoreProvider) traits.

pub mod connector;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod metadata;
pub mod reconcile;
pub mod schema;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{Disposition, ReconcilerError};
pub use identity::{RecoverySource, RemoteIdentity};
pub use reconcile::reconcile;
pub use store::{KubeResourceStore, ResourceStore, StoreError};
pub use types::{ReconcileOutcome, Reconciler, TriggerSource};
