//! # Status Persistence
//!
//! Writes through the [`ResourceStore`]. Each helper replaces the caller's
//! copy with the object returned by the store, so the next write carries the
//! current resource version.

use crate::constants::CONNECTOR_DASHBOARD_URL;
use crate::controller::reconciler::status::conditions::ConditionSet;
use crate::controller::reconciler::store::{ResourceStore, StoreError};
use crate::crd::{FivetranConnector, FivetranConnectorStatus};
use tracing::debug;

/// Upsert one condition and write status
///
/// # Errors
/// Returns the store error when the status write fails
pub async fn set_condition(
    store: &dyn ResourceStore,
    resource: &mut FivetranConnector,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Result<(), StoreError> {
    let generation = resource.metadata.generation;
    let current = resource.status.get_or_insert_with(FivetranConnectorStatus::default);

    let mut conditions = ConditionSet::from_conditions(&current.conditions);
    conditions.upsert(
        condition_type,
        status,
        reason,
        message,
        &chrono::Utc::now().to_rfc3339(),
    );
    current.conditions = conditions.into_conditions();
    current.observed_generation = generation;

    debug!(
        condition.r#type = condition_type,
        condition.status = status,
        condition.reason = reason,
        "status.condition.set"
    );
    *resource = store.update_status(resource).await?;
    Ok(())
}

/// Record the connector id and dashboard URL in status
///
/// # Errors
/// Returns the store error when the status write fails
pub async fn set_connector_id(
    store: &dyn ResourceStore,
    resource: &mut FivetranConnector,
    connector_id: &str,
) -> Result<(), StoreError> {
    let current = resource.status.get_or_insert_with(FivetranConnectorStatus::default);
    current.connector_id = Some(connector_id.to_string());
    current.connector_url = Some(connector_url(connector_id));
    *resource = store.update_status(resource).await?;
    Ok(())
}

/// Write metadata (annotations, labels, finalizers) after local edits
///
/// # Errors
/// Returns the store error when the update fails
pub async fn save(
    store: &dyn ResourceStore,
    resource: &mut FivetranConnector,
) -> Result<(), StoreError> {
    *resource = store.update(resource).await?;
    Ok(())
}

#[must_use]
pub fn connector_url(connector_id: &str) -> String {
    format!("{CONNECTOR_DASHBOARD_URL}/{connector_id}")
}

/// Whether any condition recorded on the resource is `False`
#[must_use]
pub fn has_failed_conditions(resource: &FivetranConnector) -> bool {
    resource
        .status
        .as_ref()
        .is_some_and(|s| ConditionSet::from_conditions(&s.conditions).has_failed())
}
