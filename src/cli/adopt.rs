//! # Adopt Command
//!
//! Requests adoption of an existing Fivetran connector. The operator checks
//! that service, group and destination schema match before taking it over.

use anyhow::{Context, Result};
use fivetran_operator::constants::{ADOPT_CONNECTOR_ANNOTATION, FORCE_RECONCILE_LABEL};
use fivetran_operator::crd::FivetranConnector;
use kube::{
    api::{Api, Patch, PatchParams},
    Client,
};
use serde_json::json;

pub async fn adopt_command(
    client: Client,
    name: String,
    connector_id: String,
    namespace: Option<String>,
) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<FivetranConnector> = Api::namespaced(client, ns);

    let connector = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get FivetranConnector '{ns}/{name}'"))?;

    if let Some(current) = connector
        .status
        .as_ref()
        .and_then(|s| s.connector_id.as_deref())
        .filter(|id| !id.is_empty())
    {
        anyhow::bail!(
            "FivetranConnector '{ns}/{name}' already manages connector '{current}'"
        );
    }

    // The label makes the operator pick the request up without a spec change
    let patch = json!({
        "metadata": {
            "annotations": {
                ADOPT_CONNECTOR_ANNOTATION: connector_id
            },
            "labels": {
                FORCE_RECONCILE_LABEL: "true"
            }
        }
    });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("Failed to annotate FivetranConnector '{ns}/{name}'"))?;

    println!("Adoption of connector '{connector_id}' requested for FivetranConnector '{ns}/{name}'");
    Ok(())
}
