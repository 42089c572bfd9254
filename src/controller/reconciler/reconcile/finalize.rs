//! # Finalizer Handling
//!
//! The finalizer keeps a deleted resource around until its Fivetran
//! connector has been removed.

use crate::constants::{
    CONDITION_CONNECTOR_READY, REASON_DELETION_FAILED, REASON_FINALIZER_UPDATE_FAILED,
    REASON_RECONCILIATION_FAILED,
};
use crate::controller::reconciler::error::{FailedStep, ReconcilerError, StepContext};
use crate::controller::reconciler::metadata;
use crate::controller::reconciler::status;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler};
use crate::crd::FivetranConnector;
use crate::observability::metrics;
use kube::ResourceExt;
use tracing::{debug, info};

/// Add the finalizer if it is missing
pub(crate) async fn ensure_finalizer(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
) -> Result<(), FailedStep> {
    if metadata::add_finalizer(resource) {
        debug!("Adding finalizer to {}", resource.name_any());
        status::save(ctx.store.as_ref(), resource)
            .await
            .step(CONDITION_CONNECTOR_READY, REASON_FINALIZER_UPDATE_FAILED)?;
    }
    Ok(())
}

/// Delete the remote connector, then release the resource
///
/// A connector that is already gone counts as deleted.
pub(crate) async fn finalize_deletion(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
) -> Result<ReconcileOutcome, FailedStep> {
    if !metadata::has_finalizer(resource) {
        return Ok(ReconcileOutcome::Done);
    }

    let name = resource.name_any();
    let connector_id = resource
        .status
        .as_ref()
        .and_then(|s| s.connector_id.clone())
        .filter(|id| !id.is_empty())
        .or_else(|| metadata::backup_connector_id(resource).map(str::to_string));

    if let Some(connector_id) = connector_id {
        match ctx.fivetran.delete_connector(&connector_id).await {
            Ok(()) => {
                metrics::increment_connector_operations("delete");
                info!("Deleted connector {} for {}", connector_id, name);
            }
            Err(e) if e.is_not_found() => {
                info!(
                    "Connector {} for {} was already deleted",
                    connector_id, name
                );
            }
            Err(e) => {
                return Err(FailedStep::new(
                    CONDITION_CONNECTOR_READY,
                    REASON_DELETION_FAILED,
                    ReconcilerError::api("delete connector", e),
                ))
            }
        }
    } else {
        debug!("No connector recorded for {}, nothing to delete", name);
    }

    metadata::remove_finalizer(resource);
    status::save(ctx.store.as_ref(), resource)
        .await
        .step(CONDITION_CONNECTOR_READY, REASON_DELETION_FAILED)?;
    Ok(ReconcileOutcome::Done)
}

/// Drop the force label and adoption request once they have been acted on
pub(crate) async fn clear_markers(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
) -> Result<(), FailedStep> {
    if metadata::clear_transient_markers(resource) {
        debug!("Clearing transient markers on {}", resource.name_any());
        status::save(ctx.store.as_ref(), resource)
            .await
            .step(CONDITION_CONNECTOR_READY, REASON_RECONCILIATION_FAILED)?;
    }
    Ok(())
}
