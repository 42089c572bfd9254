//! # Fivetran API Types
//!
//! Request and response payloads of the Fivetran REST API (`/v1/connections`).

use crate::crd::SchemaChangeHandling;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response envelope shared by every Fivetran endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Settings shared by connector create and update calls
///
/// Every field is sent on every call so an update sets, rather than patches,
/// the remote connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_sync_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_after_trial: Option<bool>,
    /// Setup tests are run through their own endpoint
    pub run_setup_tests: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_certificates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_fingerprints: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_delay_sensitivity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_delay_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networking_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_link_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_deployment_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
}

/// `POST /v1/connections`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateConnectorRequest {
    pub service: String,
    pub group_id: String,
    #[serde(flatten)]
    pub settings: ConnectorSettings,
}

/// `PATCH /v1/connections/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConnectorRequest {
    #[serde(flatten)]
    pub settings: ConnectorSettings,
    /// Cannot be set on create, only here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<String>,
}

/// Connector as returned by Fivetran
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorDetails {
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub service: String,
    /// Destination schema name the connector writes into
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub schedule_type: Option<String>,
    #[serde(default)]
    pub sync_frequency: Option<u32>,
    #[serde(default)]
    pub daily_sync_time: Option<String>,
    #[serde(default)]
    pub setup_tests: Vec<SetupTestResult>,
}

/// `POST /v1/connections/{id}/test`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupTestsRequest {
    pub trust_certificates: bool,
    pub trust_fingerprints: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetupTestResult {
    pub title: String,
    /// PASSED, SKIPPED, WARNING, FAILED, JOB_FAILED ...
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub details: Option<String>,
}

/// Live schema configuration of a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDetails {
    #[serde(default)]
    pub schema_change_handling: String,
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaState {
    #[serde(default)]
    pub name_in_destination: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub tables: BTreeMap<String, TableState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    #[serde(default)]
    pub name_in_destination: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub sync_mode: Option<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnState>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnState {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub hashed: Option<bool>,
    #[serde(default)]
    pub is_primary_key: Option<bool>,
}

/// `PATCH /v1/connections/{id}/schemas`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfigRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_change_handling: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaUpdate {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, TableUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableUpdate {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, ColumnUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnUpdate {
    pub enabled: bool,
    pub hashed: bool,
    pub is_primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masking_algorithm: Option<String>,
}

/// Exclusion mode of a schema reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExcludeMode {
    /// Keep current enablement, include what the policy admits
    Preserve,
    /// Newly discovered objects stay disabled
    Exclude,
}

impl ExcludeMode {
    /// `BLOCK_ALL` must not auto-include anything discovered by the reload
    #[must_use]
    pub fn for_policy(policy: Option<SchemaChangeHandling>) -> Self {
        match policy {
            Some(SchemaChangeHandling::BlockAll) => ExcludeMode::Exclude,
            _ => ExcludeMode::Preserve,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludeMode::Preserve => "PRESERVE",
            ExcludeMode::Exclude => "EXCLUDE",
        }
    }
}

/// `POST /v1/connections/{id}/schemas/reload`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadSchemaRequest {
    pub exclude_mode: ExcludeMode,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
