//! # Schema Reconciliation
//!
//! Applies the declared schema configuration and verifies it took effect.
//!
//! Fivetran only accepts settings for schemas and tables it has discovered.
//! When the live configuration still differs after an update, the source is
//! reloaded and the update applied once more. A second mismatch is terminal.

use crate::constants::{
    CONDITION_SCHEMA_READY, MESSAGE_SCHEMA_READY, REASON_RECONCILED_SUCCESSFULLY,
    SCHEMA_HASH_ANNOTATION,
};
use crate::controller::reconciler::error::ReconcilerError;
use crate::controller::reconciler::fingerprint;
use crate::controller::reconciler::metadata;
use crate::controller::reconciler::status::{self, STATUS_TRUE};
use crate::controller::reconciler::types::Reconciler;
use crate::crd::{FivetranConnector, SchemaSpec};
use crate::fivetran::{
    build_schema_request, compare_schema, ExcludeMode, SchemaConfigRequest, SchemaMismatch,
};
use crate::observability::metrics;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// Reload-and-reapply cycles allowed after the first mismatch
const RECOVERY_CYCLES: usize = 1;

/// Push the declared schema configuration and verify it
///
/// # Errors
/// Returns [`ReconcilerError::SchemaMismatchAfterRetry`] when the live
/// configuration still differs after the recovery cycle, a build error for an
/// unusable declaration, or the API and store errors of the individual calls
pub async fn reconcile_schema(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    connector_id: &str,
) -> Result<(), ReconcilerError> {
    let Some(declared) = resource.spec.connector_schemas.clone() else {
        return Ok(());
    };
    let request = build_schema_request(&declared)?;
    let exclude_mode = ExcludeMode::for_policy(declared.schema_change_handling);
    let name = resource.name_any();

    match ctx.fivetran.get_schema_details(connector_id).await {
        Ok(_) => {}
        Err(e) if e.is_schema_not_found() => {
            info!(
                "No schema configuration yet for connector {} ({}), reloading",
                connector_id, name
            );
            reload(ctx, connector_id, exclude_mode).await?;
        }
        Err(e) => return Err(ReconcilerError::api("get schema details", e)),
    }

    apply(ctx, resource, connector_id, &request).await?;
    let mut report = verify(ctx, connector_id, &declared).await?;

    for cycle in 1..=RECOVERY_CYCLES {
        if !report.has_mismatch() {
            break;
        }
        warn!(
            "Schema configuration for {} does not match after update (cycle {}): {}",
            name, cycle, report
        );
        metrics::increment_schema_drift_retries();
        reload(ctx, connector_id, exclude_mode).await?;
        apply(ctx, resource, connector_id, &request).await?;
        report = verify(ctx, connector_id, &declared).await?;
    }

    if report.has_mismatch() {
        metrics::increment_schema_mismatches();
        return Err(ReconcilerError::SchemaMismatchAfterRetry {
            report: report.to_string(),
        });
    }

    status::set_condition(
        ctx.store.as_ref(),
        resource,
        CONDITION_SCHEMA_READY,
        STATUS_TRUE,
        REASON_RECONCILED_SUCCESSFULLY,
        MESSAGE_SCHEMA_READY,
    )
    .await?;
    info!("Schema configuration reconciled for {}", name);
    Ok(())
}

async fn reload(
    ctx: &Reconciler,
    connector_id: &str,
    exclude_mode: ExcludeMode,
) -> Result<(), ReconcilerError> {
    debug!(
        "Reloading schema for connector {} (exclude_mode: {})",
        connector_id,
        exclude_mode.as_str()
    );
    ctx.fivetran
        .reload_schema(connector_id, exclude_mode)
        .await
        .map_err(|e| ReconcilerError::api("reload schema", e))?;
    Ok(())
}

/// Send the update and remember what was applied
async fn apply(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    connector_id: &str,
    request: &SchemaConfigRequest,
) -> Result<(), ReconcilerError> {
    ctx.fivetran
        .update_schema(connector_id, request)
        .await
        .map_err(|e| ReconcilerError::api("update schema", e))?;

    let digest = fingerprint::schema_fingerprint(resource.spec.connector_schemas.as_ref())
        .map_err(|e| ReconcilerError::Internal(e.into()))?;
    metadata::set_annotation(resource, SCHEMA_HASH_ANNOTATION, digest);
    status::save(ctx.store.as_ref(), resource).await?;
    Ok(())
}

async fn verify(
    ctx: &Reconciler,
    connector_id: &str,
    declared: &SchemaSpec,
) -> Result<SchemaMismatch, ReconcilerError> {
    let live = ctx
        .fivetran
        .get_schema_details(connector_id)
        .await
        .map_err(|e| ReconcilerError::api("get schema details", e))?;
    let (_, report) = compare_schema(&live, Some(declared));
    Ok(report)
}
