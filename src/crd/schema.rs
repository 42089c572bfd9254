//! # Schema Configuration
//!
//! Declared schema → table → column selection for a connector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared schema configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SchemaSpec {
    /// Schemas keyed by source schema name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaNode>,
    /// How Fivetran treats schemas, tables and columns it has not seen before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_change_handling: Option<SchemaChangeHandling>,
}

impl SchemaSpec {
    /// A schema block counts as declared when it names schemas or a change-handling policy
    #[must_use]
    pub fn is_declared(&self) -> bool {
        !self.schemas.is_empty() || self.schema_change_handling.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
pub struct SchemaNode {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, TableNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
pub struct TableNode {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<SyncMode>,
    /// Column settings are pushed to Fivetran but never drift-checked
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, ColumnSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ColumnSpec {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hashed: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masking_algorithm: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    SoftDelete,
    History,
    Live,
}

impl SyncMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::SoftDelete => "SOFT_DELETE",
            SyncMode::History => "HISTORY",
            SyncMode::Live => "LIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchemaChangeHandling {
    /// New schemas, tables and columns are synced
    AllowAll,
    /// Only new columns of already enabled tables are synced
    AllowColumns,
    /// Nothing new is synced until explicitly enabled
    BlockAll,
}

impl SchemaChangeHandling {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaChangeHandling::AllowAll => "ALLOW_ALL",
            SchemaChangeHandling::AllowColumns => "ALLOW_COLUMNS",
            SchemaChangeHandling::BlockAll => "BLOCK_ALL",
        }
    }
}
