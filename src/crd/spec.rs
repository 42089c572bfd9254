//! # FivetranConnector Spec
//!
//! Main CRD specification types.

use serde::{Deserialize, Serialize};

/// FivetranConnector Custom Resource Definition
///
/// Declares a Fivetran connector and, optionally, the schema/table/column
/// selection it should sync. String values inside `config` and `auth` may be
/// Vault references of the form `vault:<path>#<key>`.
///
/// # Example
///
/// ```yaml
/// apiVersion: operator.dataverse.redhat.com/v1alpha1
/// kind: FivetranConnector
/// metadata:
///   name: orders-postgres
///   namespace: fivetran-operator
/// spec:
///   connector:
///     service: postgres
///     group_id: warehouse_group
///     sync_frequency: 1440
///     daily_sync_time: "03:00"
///     config:
///       host: orders.db.internal
///       user: fivetran
///       password: vault:secret/orders/db#password
///       schema_prefix: orders
///   connectorSchemas:
///     schema_change_handling: BLOCK_ALL
///     schemas:
///       public:
///         enabled: true
///         tables:
///           orders:
///             enabled: true
///             sync_mode: SOFT_DELETE
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "FivetranConnector",
    group = "operator.dataverse.redhat.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::FivetranConnectorStatus",
    shortname = "ftc",
    printcolumn = r#"{"name":"ConnectorReady", "type":"string", "jsonPath":".status.conditions[?(@.type==\"ConnectorReady\")].status"}, {"name":"ConnectorURL", "type":"string", "jsonPath":".status.connectorUrl"}, {"name":"SetupTests", "type":"string", "jsonPath":".status.conditions[?(@.type==\"SetupTestReady\")].status"}, {"name":"Schema", "type":"string", "jsonPath":".status.conditions[?(@.type==\"SchemaReady\")].status"}, {"name":"ConnectorID", "type":"string", "jsonPath":".status.connectorId", "priority":1}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FivetranConnectorSpec {
    /// Connector settings sent to Fivetran
    pub connector: ConnectorSpec,
    /// Schema, table and column selection
    /// When omitted the connector keeps whatever schema configuration Fivetran derives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_schemas: Option<crate::crd::SchemaSpec>,
}

impl FivetranConnectorSpec {
    /// Whether a schema configuration was declared at all
    #[must_use]
    pub fn has_schema_config(&self) -> bool {
        self.connector_schemas
            .as_ref()
            .is_some_and(crate::crd::SchemaSpec::is_declared)
    }
}

/// Connector settings
///
/// Field names follow the Fivetran REST API so the same document can be
/// copied from Fivetran's documentation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[schemars(extend("x-kubernetes-validations" = [
    {
        "rule": "!has(self.daily_sync_time) || (has(self.sync_frequency) && self.sync_frequency == 1440)",
        "message": "daily_sync_time can only be set when sync_frequency is 1440"
    }
]))]
pub struct ConnectorSpec {
    /// Destination group the connector belongs to (immutable)
    #[schemars(extend("x-kubernetes-validations" = [
        {"rule": "self == oldSelf", "message": "group_id is immutable"}
    ]))]
    pub group_id: String,
    /// Connector type, e.g. `postgres` or `salesforce` (immutable)
    #[schemars(extend("x-kubernetes-validations" = [
        {"rule": "self == oldSelf", "message": "service is immutable"}
    ]))]
    pub service: String,
    /// Authentication document, may contain Vault references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub auth: Option<serde_json::Value>,
    /// Service specific configuration, may contain Vault references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub config: Option<serde_json::Value>,
    /// Time of day (HH:00) to sync, only with a 1440 minute frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(extend("pattern" = "^([0-1]?[0-9]|2[0-3]):00$"))]
    pub daily_sync_time: Option<String>,
    /// Sync frequency in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_frequency: Option<u32>,
    /// `auto` or `manual`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_type: Option<ScheduleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// Run Fivetran setup tests after every create/update (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_setup_tests: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_after_trial: Option<bool>,
    /// Trust server certificates during setup tests (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_certificates: Option<bool>,
    /// Trust SSH fingerprints during setup tests (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_fingerprints: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_delay_sensitivity: Option<DataDelaySensitivity>,
    /// Custom delay threshold in minutes, used with `CUSTOM` sensitivity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_delay_threshold: Option<i32>,
    /// `Directly`, `SshTunnel`, `ProxyAgent` or `PrivateLink`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_link_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid_deployment_agent_id: Option<String>,
}

impl ConnectorSpec {
    #[must_use]
    pub fn run_setup_tests(&self) -> bool {
        self.run_setup_tests.unwrap_or(true)
    }

    #[must_use]
    pub fn trust_certificates(&self) -> bool {
        self.trust_certificates.unwrap_or(true)
    }

    #[must_use]
    pub fn trust_fingerprints(&self) -> bool {
        self.trust_fingerprints.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    Auto,
    Manual,
}

impl ScheduleType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Auto => "auto",
            ScheduleType::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataDelaySensitivity {
    Low,
    Normal,
    High,
    Custom,
    SyncFrequency,
}

impl DataDelaySensitivity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataDelaySensitivity::Low => "LOW",
            DataDelaySensitivity::Normal => "NORMAL",
            DataDelaySensitivity::High => "HIGH",
            DataDelaySensitivity::Custom => "CUSTOM",
            DataDelaySensitivity::SyncFrequency => "SYNC_FREQUENCY",
        }
    }
}

/// Schema for free-form documents (`config`, `auth`)
fn preserve_unknown_fields(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}
