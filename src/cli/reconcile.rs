//! # Reconcile Command
//!
//! Forces a full reconciliation by setting the force-reconcile label. The
//! operator removes the label once the pass completes.

use anyhow::{Context, Result};
use fivetran_operator::constants::FORCE_RECONCILE_LABEL;
use fivetran_operator::crd::FivetranConnector;
use kube::{
    api::{Api, Patch, PatchParams},
    Client,
};
use serde_json::json;

pub async fn reconcile_command(
    client: Client,
    name: String,
    namespace: Option<String>,
) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<FivetranConnector> = Api::namespaced(client, ns);

    println!("Triggering reconciliation for FivetranConnector '{ns}/{name}'...");

    let patch = json!({
        "metadata": {
            "labels": {
                FORCE_RECONCILE_LABEL: "true"
            }
        }
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("Failed to label FivetranConnector '{ns}/{name}'"))?;

    println!("Reconciliation triggered");
    println!("Check progress with: fivetranctl status {name} --namespace {ns}");
    Ok(())
}
