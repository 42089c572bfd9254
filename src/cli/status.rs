//! # Status Command
//!
//! Command to show the status of a FivetranConnector resource.

use anyhow::{Context, Result};
use fivetran_operator::constants::{ADOPT_CONNECTOR_ANNOTATION, FORCE_RECONCILE_LABEL};
use fivetran_operator::crd::FivetranConnector;
use kube::{api::Api, Client};

/// Show status of a FivetranConnector resource
pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<FivetranConnector> = Api::namespaced(client, ns);

    let connector = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get FivetranConnector '{ns}/{name}'"))?;

    println!("FivetranConnector: {ns}/{name}");
    println!("  Service:    {}", connector.spec.connector.service);
    println!("  Group:      {}", connector.spec.connector.group_id);
    println!(
        "  Generation: {}",
        connector.metadata.generation.unwrap_or(0)
    );
    if connector.metadata.deletion_timestamp.is_some() {
        println!("  Deleting:   yes");
    }
    if connector
        .metadata
        .labels
        .as_ref()
        .is_some_and(|l| l.contains_key(FORCE_RECONCILE_LABEL))
    {
        println!("  Forced reconciliation pending");
    }
    if let Some(id) = connector
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ADOPT_CONNECTOR_ANNOTATION))
    {
        println!("  Adoption of connector '{id}' pending");
    }

    let Some(status) = &connector.status else {
        println!("\nNo status recorded yet.");
        return Ok(());
    };

    println!(
        "  Connector:  {}",
        status.connector_id.as_deref().unwrap_or("-")
    );
    if let Some(url) = &status.connector_url {
        println!("  URL:        {url}");
    }
    println!(
        "  Observed generation: {}",
        status
            .observed_generation
            .map_or_else(|| "-".to_string(), |g| g.to_string())
    );

    if status.conditions.is_empty() {
        return Ok(());
    }

    println!("\nConditions:");
    for condition in &status.conditions {
        println!(
            "  {:<16} {:<8} {:<36} {}",
            condition.r#type,
            condition.status,
            condition.reason.as_deref().unwrap_or("-"),
            condition.last_transition_time.as_deref().unwrap_or("-")
        );
        if let Some(message) = condition.message.as_deref().filter(|m| !m.is_empty()) {
            println!("    {message}");
        }
    }

    Ok(())
}
