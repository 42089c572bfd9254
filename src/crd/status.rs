//! # FivetranConnector Status
//!
//! Status types for tracking reconciliation state and conditions.

use serde::{Deserialize, Serialize};

/// Status of the FivetranConnector resource
///
/// Option fields serialize as `null` so a merge patch clears them.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FivetranConnectorStatus {
    /// Fivetran connector id, authoritative once recorded
    #[serde(default)]
    pub connector_id: Option<String>,
    /// Link to the connector in the Fivetran dashboard
    #[serde(default)]
    pub connector_url: Option<String>,
    /// Generation of the spec the conditions describe
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// ConnectorReady, SetupTestReady and SchemaReady, at most one of each
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Kubernetes-style status condition
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    /// "True", "False" or "Unknown"
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
