//! # Schema Comparison
//!
//! Structural comparison of a connector's live schema configuration against
//! the declared [`SchemaSpec`].
//!
//! Only schema and table settings are judged. Column settings are pushed but
//! never compared: verifying them needs one extra API call per table, which
//! does not scale to wide sources.

use crate::crd::{SchemaNode, SchemaSpec, TableNode};
use crate::fivetran::types::{SchemaDetails, SchemaState, TableState};
use std::collections::BTreeMap;
use std::fmt;

/// Every discrepancy found between live and declared schema configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMismatch {
    /// "expected X, got Y"
    pub schema_change_handling: Option<String>,
    /// Declared schemas absent from the live configuration
    pub missing_schemas: Vec<String>,
    /// Schema name → reason
    pub schema_mismatches: BTreeMap<String, String>,
    /// Schema name → table issues
    pub table_mismatches: BTreeMap<String, Vec<String>>,
}

impl SchemaMismatch {
    #[must_use]
    pub fn has_mismatch(&self) -> bool {
        self.schema_change_handling.is_some()
            || !self.missing_schemas.is_empty()
            || !self.schema_mismatches.is_empty()
            || !self.table_mismatches.is_empty()
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_mismatch() {
            return f.write_str("No schema mismatches found");
        }

        let mut parts = Vec::new();
        if let Some(handling) = &self.schema_change_handling {
            parts.push(format!("Schema Change Handling: {handling}"));
        }
        if !self.missing_schemas.is_empty() {
            parts.push(format!(
                "Missing Schemas: {}",
                self.missing_schemas.join(", ")
            ));
        }
        for (schema, reason) in &self.schema_mismatches {
            parts.push(format!("Schema {schema}: {reason}"));
        }
        for (schema, issues) in &self.table_mismatches {
            parts.push(format!("Schema {schema} tables: {}", issues.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Compare live schema configuration with the declared one
///
/// Returns `(matches, report)`. An absent declaration always matches.
#[must_use]
pub fn compare_schema(
    live: &SchemaDetails,
    declared: Option<&SchemaSpec>,
) -> (bool, SchemaMismatch) {
    let mut report = SchemaMismatch::default();
    let Some(declared) = declared else {
        return (true, report);
    };

    if let Some(expected) = declared.schema_change_handling {
        if live.schema_change_handling != expected.as_str() {
            report.schema_change_handling = Some(format!(
                "expected {}, got {}",
                expected.as_str(),
                live.schema_change_handling
            ));
        }
    }

    for (schema_name, declared_schema) in &declared.schemas {
        let Some(live_schema) = live.schemas.get(schema_name) else {
            report.missing_schemas.push(schema_name.clone());
            continue;
        };

        if let Some(reason) = compare_enabled(declared_schema.enabled, live_schema.enabled) {
            report
                .schema_mismatches
                .insert(schema_name.clone(), reason);
        }

        let issues = compare_tables(declared_schema, live_schema);
        if !issues.is_empty() {
            report.table_mismatches.insert(schema_name.clone(), issues);
        }
    }

    (!report.has_mismatch(), report)
}

/// A live flag that is unset is not judged
fn compare_enabled(expected: bool, live: Option<bool>) -> Option<String> {
    match live {
        Some(actual) if actual != expected => Some(format!(
            "enabled state mismatch: expected {expected}, got {actual}"
        )),
        _ => None,
    }
}

fn compare_tables(declared: &SchemaNode, live: &SchemaState) -> Vec<String> {
    let mut issues = Vec::new();
    for (table_name, declared_table) in &declared.tables {
        match live.tables.get(table_name) {
            None => issues.push(format!("table {table_name} not found in source")),
            Some(live_table) => {
                let table_issues = compare_table(declared_table, live_table);
                if !table_issues.is_empty() {
                    issues.push(format!("table {table_name}: {}", table_issues.join(", ")));
                }
            }
        }
    }
    issues
}

fn compare_table(declared: &TableNode, live: &TableState) -> Vec<String> {
    let mut issues = Vec::new();
    if let Some(reason) = compare_enabled(declared.enabled, live.enabled) {
        issues.push(reason);
    }
    if let Some(expected) = declared.sync_mode {
        match live.sync_mode.as_deref() {
            None => issues.push(format!(
                "sync mode mismatch: expected {}, got nil",
                expected.as_str()
            )),
            Some(actual) if actual != expected.as_str() => issues.push(format!(
                "sync mode mismatch: expected {}, got {actual}",
                expected.as_str()
            )),
            Some(_) => {}
        }
    }
    issues
}
