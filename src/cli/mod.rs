//! # fivetranctl
//!
//! Command-line interface for the Fivetran Operator.
//!
//! ## Usage
//!
//! ```bash
//! # List FivetranConnector resources
//! fivetranctl list
//!
//! # Show status and conditions of a FivetranConnector
//! fivetranctl status orders-postgres --namespace data
//!
//! # Force a full reconciliation
//! fivetranctl reconcile orders-postgres --namespace data
//!
//! # Adopt an existing Fivetran connector
//! fivetranctl adopt orders-postgres decent_dropsy --namespace data
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod adopt;
mod list;
mod reconcile;
mod status;

/// Fivetran Operator CLI
#[derive(Parser)]
#[command(name = "fivetranctl")]
#[command(
    about = "Fivetran Operator CLI",
    long_about = None,
    after_help = "\
Examples:
  fivetranctl list
  fivetranctl status orders-postgres --namespace data
  fivetranctl reconcile orders-postgres
  fivetranctl adopt orders-postgres decent_dropsy
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to 'default'; `list` searches all namespaces when unset)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List FivetranConnector resources
    List,
    /// Show status of a FivetranConnector resource
    Status {
        /// Name of the FivetranConnector resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Force a full reconciliation of a FivetranConnector resource
    Reconcile {
        /// Name of the FivetranConnector resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Adopt an existing Fivetran connector instead of creating a new one
    Adopt {
        /// Name of the FivetranConnector resource
        #[arg(value_name = "NAME")]
        name: String,

        /// Id of the existing Fivetran connector
        #[arg(value_name = "CONNECTOR_ID")]
        connector_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fivetranctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::List => list::list_command(client, cli.namespace).await,
        Commands::Status { name } => status::status_command(client, name, cli.namespace).await,
        Commands::Reconcile { name } => {
            reconcile::reconcile_command(client, name, cli.namespace).await
        }
        Commands::Adopt { name, connector_id } => {
            adopt::adopt_command(client, name, connector_id, cli.namespace).await
        }
    }
}
