//! # List Command
//!
//! Command to list FivetranConnector resources.

use anyhow::{Context, Result};
use fivetran_operator::constants::{
    CONDITION_CONNECTOR_READY, CONDITION_SCHEMA_READY, CONDITION_SETUP_TEST_READY,
};
use fivetran_operator::crd::FivetranConnector;
use kube::{api::Api, Client};

/// List FivetranConnector resources
pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<FivetranConnector> = if let Some(ns) = &namespace {
        println!("Listing FivetranConnector resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing FivetranConnector resources in all namespaces...");
        Api::all(client)
    };

    let connectors = api
        .list(&kube::api::ListParams::default())
        .await
        .context("Failed to list FivetranConnector resources")?;

    if connectors.items.is_empty() {
        println!("No FivetranConnector resources found.");
        return Ok(());
    }

    println!(
        "\n{:<30} {:<20} {:<15} {:<26} {:<12} {:<12} {:<12}",
        "NAME", "NAMESPACE", "SERVICE", "CONNECTOR ID", "READY", "SETUP", "SCHEMA"
    );
    println!("{}", "-".repeat(131));

    for connector in connectors.items {
        let name = connector.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = connector.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let service = connector.spec.connector.service.as_str();
        let connector_id = connector
            .status
            .as_ref()
            .and_then(|s| s.connector_id.as_deref())
            .unwrap_or("-");
        let ready = condition_status(&connector, CONDITION_CONNECTOR_READY);
        let setup = condition_status(&connector, CONDITION_SETUP_TEST_READY);
        let schema = condition_status(&connector, CONDITION_SCHEMA_READY);

        println!(
            "{name:<30} {ns:<20} {service:<15} {connector_id:<26} {ready:<12} {setup:<12} {schema:<12}"
        );
    }

    Ok(())
}

fn condition_status<'a>(connector: &'a FivetranConnector, condition_type: &str) -> &'a str {
    connector
        .status
        .as_ref()
        .and_then(|s| s.conditions.iter().find(|c| c.r#type == condition_type))
        .map_or("Unknown", |c| c.status.as_str())
}
