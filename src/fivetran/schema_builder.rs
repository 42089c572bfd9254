//! # Schema Builder
//!
//! Builds the `PATCH /v1/connections/{id}/schemas` payload.
//!
//! The builder records the first invalid call and reports it from
//! [`SchemaConfigBuilder::build`], so chained calls need no intermediate checks.

use crate::crd::{SchemaChangeHandling, SchemaSpec};
use crate::fivetran::types::{ColumnUpdate, SchemaConfigRequest};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaBuildError {
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    #[error("table name cannot be empty in schema '{schema}'")]
    EmptyTableName { schema: String },
    #[error("column name cannot be empty in table '{schema}.{table}'")]
    EmptyColumnName { schema: String, table: String },
    #[error("table '{table}' added before schema '{schema}'")]
    UnknownSchema { schema: String, table: String },
    #[error("column '{column}' added before table '{schema}.{table}'")]
    UnknownTable {
        schema: String,
        table: String,
        column: String,
    },
}

#[derive(Debug, Default)]
pub struct SchemaConfigBuilder {
    request: SchemaConfigRequest,
    error: Option<SchemaBuildError>,
}

impl SchemaConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn schema_change_handling(mut self, policy: SchemaChangeHandling) -> Self {
        self.request.schema_change_handling = Some(policy.as_str().to_string());
        self
    }

    #[must_use]
    pub fn schema(mut self, name: &str, enabled: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        if name.is_empty() {
            self.error = Some(SchemaBuildError::EmptySchemaName);
            return self;
        }
        self.request
            .schemas
            .entry(name.to_string())
            .or_default()
            .enabled = enabled;
        self
    }

    #[must_use]
    pub fn table(mut self, schema: &str, name: &str, enabled: bool, sync_mode: Option<&str>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if name.is_empty() {
            self.error = Some(SchemaBuildError::EmptyTableName {
                schema: schema.to_string(),
            });
            return self;
        }
        let Some(schema_update) = self.request.schemas.get_mut(schema) else {
            self.error = Some(SchemaBuildError::UnknownSchema {
                schema: schema.to_string(),
                table: name.to_string(),
            });
            return self;
        };
        let table = schema_update.tables.entry(name.to_string()).or_default();
        table.enabled = enabled;
        table.sync_mode = sync_mode.map(str::to_string);
        self
    }

    #[must_use]
    pub fn column(mut self, schema: &str, table: &str, name: &str, column: ColumnUpdate) -> Self {
        if self.error.is_some() {
            return self;
        }
        if name.is_empty() {
            self.error = Some(SchemaBuildError::EmptyColumnName {
                schema: schema.to_string(),
                table: table.to_string(),
            });
            return self;
        }
        let Some(table_update) = self
            .request
            .schemas
            .get_mut(schema)
            .and_then(|s| s.tables.get_mut(table))
        else {
            self.error = Some(SchemaBuildError::UnknownTable {
                schema: schema.to_string(),
                table: table.to_string(),
                column: name.to_string(),
            });
            return self;
        };
        table_update.columns.insert(name.to_string(), column);
        self
    }

    pub fn build(self) -> Result<SchemaConfigRequest, SchemaBuildError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }
}

/// Translate a declared schema tree into the update payload
pub fn build_schema_request(spec: &SchemaSpec) -> Result<SchemaConfigRequest, SchemaBuildError> {
    let mut builder = SchemaConfigBuilder::new();
    if let Some(policy) = spec.schema_change_handling {
        builder = builder.schema_change_handling(policy);
    }

    for (schema_name, schema) in &spec.schemas {
        builder = builder.schema(schema_name, schema.enabled);
        for (table_name, table) in &schema.tables {
            builder = builder.table(
                schema_name,
                table_name,
                table.enabled,
                table.sync_mode.map(|mode| mode.as_str()),
            );
            for (column_name, column) in &table.columns {
                builder = builder.column(
                    schema_name,
                    table_name,
                    column_name,
                    ColumnUpdate {
                        enabled: column.enabled,
                        hashed: column.hashed,
                        is_primary_key: column.is_primary_key,
                        masking_algorithm: column.masking_algorithm.clone(),
                    },
                );
            }
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ColumnSpec, SchemaNode, SyncMode, TableNode};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_build_schema_request_from_spec() {
        let spec = SchemaSpec {
            schema_change_handling: Some(SchemaChangeHandling::BlockAll),
            schemas: BTreeMap::from([(
                "public".to_string(),
                SchemaNode {
                    enabled: true,
                    tables: BTreeMap::from([(
                        "orders".to_string(),
                        TableNode {
                            enabled: true,
                            sync_mode: Some(SyncMode::SoftDelete),
                            columns: BTreeMap::from([(
                                "email".to_string(),
                                ColumnSpec {
                                    enabled: true,
                                    hashed: true,
                                    ..Default::default()
                                },
                            )]),
                        },
                    )]),
                },
            )]),
        };

        let request = build_schema_request(&spec).unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "schema_change_handling": "BLOCK_ALL",
                "schemas": {
                    "public": {
                        "enabled": true,
                        "tables": {
                            "orders": {
                                "enabled": true,
                                "sync_mode": "SOFT_DELETE",
                                "columns": {
                                    "email": {"enabled": true, "hashed": true, "is_primary_key": false}
                                }
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let err = SchemaConfigBuilder::new().schema("", true).build().unwrap_err();
        assert_eq!(err, SchemaBuildError::EmptySchemaName);

        let err = SchemaConfigBuilder::new()
            .schema("public", true)
            .table("public", "", true, None)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaBuildError::EmptyTableName {
                schema: "public".to_string()
            }
        );
    }

    #[test]
    fn test_first_error_wins() {
        let err = SchemaConfigBuilder::new()
            .table("missing", "orders", true, None)
            .schema("", true)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::UnknownSchema { .. }));
    }

    #[test]
    fn test_column_on_unknown_table() {
        let err = SchemaConfigBuilder::new()
            .schema("public", true)
            .column("public", "orders", "id", ColumnUpdate::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaBuildError::UnknownTable { .. }));
    }
}
