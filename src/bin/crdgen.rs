//! # CRD Generator
//!
//! Prints the `FivetranConnector` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/fivetranconnector.yaml
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use fivetran_operator::crd::FivetranConnector;
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let crd = FivetranConnector::crd();
    let yaml = serde_yaml::to_string(&crd).context("Failed to serialize CRD to YAML")?;
    print!("{yaml}");
    Ok(())
}
