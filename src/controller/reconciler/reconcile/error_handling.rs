//! # Failure Handling
//!
//! Records a failed step on its condition and turns the error class into
//! an outcome for the runtime.

use crate::constants::{
    CONDITION_CONNECTOR_READY, MESSAGE_CONNECTOR_READY, REASON_RECONCILED_SUCCESSFULLY,
};
use crate::controller::reconciler::error::{Disposition, FailedStep, ReconcilerError};
use crate::controller::reconciler::status::{self, STATUS_FALSE, STATUS_TRUE};
use crate::controller::reconciler::store::StoreError;
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler};
use crate::crd::FivetranConnector;
use crate::observability::metrics;
use kube::ResourceExt;
use tracing::{error, warn};

/// Write the failure to status and decide what happens next
///
/// Terminal failures finish the pass, retryable ones requeue after the
/// configured delay and everything else is returned to the error policy.
///
/// # Errors
/// Returns the original error for [`Disposition::Propagate`], or the store
/// error when the failure itself could not be recorded
pub(crate) async fn handle_failure(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    failure: FailedStep,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let FailedStep {
        condition,
        reason,
        error: err,
    } = failure;
    error!(
        "Reconciliation of {} failed on {} ({}): {}",
        resource.name_any(),
        condition,
        reason,
        err
    );

    // A stale copy cannot carry the condition write
    if matches!(err, ReconcilerError::Store(StoreError::Conflict(_))) {
        let namespace = resource.namespace().unwrap_or_default();
        match ctx.store.get(&namespace, &resource.name_any()).await? {
            Some(fresh) => *resource = fresh,
            None => return Ok(ReconcileOutcome::NoOp),
        }
    }

    // Failed setup tests still leave a usable connector behind
    if matches!(err, ReconcilerError::SetupTestsFailed(_)) {
        status::set_condition(
            ctx.store.as_ref(),
            resource,
            CONDITION_CONNECTOR_READY,
            STATUS_TRUE,
            REASON_RECONCILED_SUCCESSFULLY,
            MESSAGE_CONNECTOR_READY,
        )
        .await?;
    }

    status::set_condition(
        ctx.store.as_ref(),
        resource,
        condition,
        STATUS_FALSE,
        reason,
        &err.to_string(),
    )
    .await?;

    match err.disposition() {
        Disposition::Terminal => Ok(ReconcileOutcome::Done),
        Disposition::Requeue => {
            let delay = ctx.config.retryable_error_requeue_duration();
            warn!(
                "Requeueing {} in {}s after retryable failure",
                resource.name_any(),
                delay.as_secs()
            );
            metrics::increment_requeues("retryable-error");
            Ok(ReconcileOutcome::RequeueAfter(delay))
        }
        Disposition::Propagate => Err(err),
    }
}
