//! # Adoption
//!
//! Takes ownership of a connector that already exists in Fivetran, either
//! because the resource asks for it by annotation or because the recorded
//! id was lost from status and survives only in the backup annotation.
//!
//! The existing connector must agree with the resource on service, group
//! and destination schema name; anything else is refused.

use crate::controller::reconciler::connector::ResolvedConnector;
use crate::controller::reconciler::error::ReconcilerError;
use crate::controller::reconciler::identity::RecoverySource;
use crate::controller::reconciler::status;
use crate::controller::reconciler::types::Reconciler;
use crate::crd::{ConnectorSpec, FivetranConnector};
use crate::fivetran::ConnectorDetails;
use crate::observability::metrics;
use kube::ResourceExt;
use serde_json::Value;
use tracing::{info, warn};

/// Destination schema name Fivetran derives from the connector config
///
/// `schema_prefix` wins when present. Otherwise `schema`, suffixed with
/// `table` or (taking precedence) `table_group_name`.
#[must_use]
pub fn expected_schema_name(config: Option<&Value>) -> Option<String> {
    let config = config?;
    let field = |key: &str| {
        config
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    };

    if let Some(prefix) = field("schema_prefix") {
        return Some(prefix.to_string());
    }

    let schema = field("schema")?;
    let mut expected = schema.to_string();
    if let Some(table) = field("table") {
        expected = format!("{schema}.{table}");
    }
    if let Some(group) = field("table_group_name") {
        expected = format!("{schema}.{group}");
    }
    Some(expected)
}

/// Check that an existing connector matches the resource
///
/// # Errors
/// Returns [`ReconcilerError::Validation`] naming the first mismatching field
pub fn validate_adoption(
    spec: &ConnectorSpec,
    resolved_config: Option<&Value>,
    existing: &ConnectorDetails,
) -> Result<(), ReconcilerError> {
    if existing.service != spec.service {
        return Err(ReconcilerError::Validation(format!(
            "service mismatch: spec has '{}', existing connector has '{}'",
            spec.service, existing.service
        )));
    }

    if existing.group_id != spec.group_id {
        return Err(ReconcilerError::Validation(format!(
            "group_id mismatch: spec has '{}', existing connector has '{}'",
            spec.group_id, existing.group_id
        )));
    }

    if let Some(expected) = expected_schema_name(resolved_config) {
        if existing.schema != expected {
            return Err(ReconcilerError::Validation(format!(
                "schema mismatch: expected '{}', got '{}'",
                expected, existing.schema
            )));
        }
    }

    Ok(())
}

/// Fetch, validate and record an existing connector
///
/// # Errors
/// Returns the API error when the connector cannot be read, a validation
/// error when it does not match, or the store error when status cannot be written
pub async fn adopt_connector(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    connector_id: &str,
    source: RecoverySource,
    resolved: &ResolvedConnector,
) -> Result<(), ReconcilerError> {
    let existing = ctx
        .fivetran
        .get_connector(connector_id)
        .await
        .map_err(|e| ReconcilerError::api("get existing connector", e))?;

    if let Err(e) = validate_adoption(&resource.spec.connector, resolved.config.as_ref(), &existing) {
        warn!(
            resource.name = resource.name_any().as_str(),
            connector.id = connector_id,
            adoption.source = source.as_str(),
            error = %e,
            "connector.adoption.rejected"
        );
        return Err(e);
    }

    status::set_connector_id(ctx.store.as_ref(), resource, connector_id).await?;
    metrics::increment_connector_operations("adopt");
    info!(
        resource.name = resource.name_any().as_str(),
        connector.id = connector_id,
        adoption.source = source.as_str(),
        "connector.adopted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing(service: &str, group_id: &str, schema: &str) -> ConnectorDetails {
        ConnectorDetails {
            id: "conn_1".to_string(),
            service: service.to_string(),
            group_id: group_id.to_string(),
            schema: schema.to_string(),
            ..Default::default()
        }
    }

    fn spec() -> ConnectorSpec {
        ConnectorSpec {
            group_id: "warehouse".to_string(),
            service: "postgres".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_schema_name() {
        assert_eq!(expected_schema_name(None), None);
        assert_eq!(expected_schema_name(Some(&json!({}))), None);
        assert_eq!(
            expected_schema_name(Some(&json!({"schema_prefix": "orders", "schema": "x"}))),
            Some("orders".to_string())
        );
        assert_eq!(
            expected_schema_name(Some(&json!({"schema": "sheets"}))),
            Some("sheets".to_string())
        );
        assert_eq!(
            expected_schema_name(Some(&json!({"schema": "sheets", "table": "budget"}))),
            Some("sheets.budget".to_string())
        );
        assert_eq!(
            expected_schema_name(Some(&json!({
                "schema": "sheets",
                "table": "budget",
                "table_group_name": "finance"
            }))),
            Some("sheets.finance".to_string())
        );
    }

    #[test]
    fn test_validate_adoption_accepts_matching_connector() {
        let config = json!({"schema_prefix": "orders"});
        assert!(validate_adoption(&spec(), Some(&config), &existing("postgres", "warehouse", "orders")).is_ok());
        // No derivable schema name means the schema is not checked
        assert!(validate_adoption(&spec(), None, &existing("postgres", "warehouse", "anything")).is_ok());
    }

    #[test]
    fn test_validate_adoption_reports_service_first() {
        let err = validate_adoption(&spec(), None, &existing("mysql", "other", "x")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: service mismatch: spec has 'postgres', existing connector has 'mysql'"
        );
    }

    #[test]
    fn test_validate_adoption_group_and_schema() {
        let err = validate_adoption(&spec(), None, &existing("postgres", "other", "x")).unwrap_err();
        assert!(err
            .to_string()
            .contains("group_id mismatch: spec has 'warehouse', existing connector has 'other'"));

        let config = json!({"schema_prefix": "orders"});
        let err = validate_adoption(&spec(), Some(&config), &existing("postgres", "warehouse", "billing"))
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("schema mismatch: expected 'orders', got 'billing'"));
    }
}
