//! # Reconciliation Logic
//!
//! One pass over a `FivetranConnector`:
//!
//! 1. Deletion: remove the remote connector, release the finalizer
//! 2. Finalizer, spec validation, remote identity
//! 3. Change detection; nothing changed means no remote call at all
//! 4. Vault client and secret resolution
//! 5. Connector create/adopt/update, then setup tests
//! 6. Schema apply and drift verification
//! 7. Follow-up connector update, transient marker cleanup
//!
//! Every step that can fail is tagged with the condition and reason it is
//! reported on; [`error_handling::handle_failure`] writes it and classifies
//! the error.

mod error_handling;
mod finalize;
pub mod needs;

pub use needs::{determine_needs, ReconcileNeeds};

use crate::constants::{
    CONDITION_CONNECTOR_READY, CONDITION_SCHEMA_READY, CONDITION_SETUP_TEST_READY,
    MESSAGE_NO_SCHEMA, REASON_ADOPTION_FAILED, REASON_RECONCILIATION_FAILED, REASON_SKIPPED,
    REASON_SPEC_VALIDATION_FAILED, REASON_VAULT_CLIENT_INIT_FAILED,
    REASON_VAULT_RESOLUTION_FAILED,
};
use crate::controller::reconciler::connector::{self, setup_tests, ResolvedConnector};
use crate::controller::reconciler::error::{FailedStep, ReconcilerError, StepContext};
use crate::controller::reconciler::identity::RemoteIdentity;
use crate::controller::reconciler::schema;
use crate::controller::reconciler::status::{self, STATUS_TRUE};
use crate::controller::reconciler::types::{ReconcileOutcome, Reconciler};
use crate::controller::reconciler::validation::validate_connector_spec;
use crate::crd::FivetranConnector;
use kube::ResourceExt;
use tracing::{debug, info};

/// Reconcile the named resource against Fivetran
///
/// The resource is read fresh from the store; a resource that no longer
/// exists is a no-op.
///
/// # Errors
/// Returns errors the pass could not record in status, and errors the
/// runtime's error policy should retry with its own delay
pub async fn reconcile(
    ctx: &Reconciler,
    namespace: &str,
    name: &str,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let Some(mut resource) = ctx.store.get(namespace, name).await? else {
        debug!("FivetranConnector {}/{} no longer exists", namespace, name);
        return Ok(ReconcileOutcome::NoOp);
    };

    match run_pass(ctx, &mut resource).await {
        Ok(outcome) => Ok(outcome),
        Err(failure) => error_handling::handle_failure(ctx, &mut resource, failure).await,
    }
}

async fn run_pass(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
) -> Result<ReconcileOutcome, FailedStep> {
    if resource.metadata.deletion_timestamp.is_some() {
        return finalize::finalize_deletion(ctx, resource).await;
    }

    finalize::ensure_finalizer(ctx, resource).await?;

    validate_connector_spec(&resource.spec.connector)
        .step(CONDITION_CONNECTOR_READY, REASON_SPEC_VALIDATION_FAILED)?;

    let identity = RemoteIdentity::of(resource);
    let needs = determine_needs(resource, &identity)
        .map_err(|e| ReconcilerError::Internal(e.into()))
        .step(CONDITION_CONNECTOR_READY, REASON_RECONCILIATION_FAILED)?;

    let name = resource.name_any();
    if needs.is_empty() {
        debug!("No changes detected for {}, skipping", name);
        finalize::clear_markers(ctx, resource).await?;
        return Ok(ReconcileOutcome::NoOp);
    }
    info!(
        "Reconciling {} (connector: {}, schema: {})",
        name, needs.connector, needs.schema
    );

    let namespace = resource.namespace().unwrap_or_default();
    let secrets = ctx
        .secrets
        .store_for(&namespace)
        .await
        .map_err(ReconcilerError::SecretStoreUnavailable)
        .step(CONDITION_CONNECTOR_READY, REASON_VAULT_CLIENT_INIT_FAILED)?;
    let resolved = ResolvedConnector::resolve(secrets.as_ref(), &resource.spec.connector)
        .await
        .step(CONDITION_CONNECTOR_READY, REASON_VAULT_RESOLUTION_FAILED)?;

    let mut connector_id = identity.connector_id().map(str::to_string);

    if needs.connector {
        let id = connector::reconcile_connector(ctx, resource, &identity, &resolved)
            .await
            .map_err(|e| {
                let reason = if matches!(e, ReconcilerError::Adoption(_)) {
                    REASON_ADOPTION_FAILED
                } else {
                    REASON_RECONCILIATION_FAILED
                };
                FailedStep::new(CONDITION_CONNECTOR_READY, reason, e)
            })?;

        setup_tests::run_setup_tests(ctx, resource, &id)
            .await
            .step(CONDITION_SETUP_TEST_READY, REASON_RECONCILIATION_FAILED)?;
        connector_id = Some(id);
    }

    if needs.schema {
        let id = connector_id.as_deref().ok_or_else(|| {
            FailedStep::new(
                CONDITION_SCHEMA_READY,
                REASON_RECONCILIATION_FAILED,
                anyhow::anyhow!("no connector id available for schema reconciliation"),
            )
        })?;
        schema::reconcile_schema(ctx, resource, id)
            .await
            .step(CONDITION_SCHEMA_READY, REASON_RECONCILIATION_FAILED)?;
    } else if !resource.spec.has_schema_config() {
        status::set_condition(
            ctx.store.as_ref(),
            resource,
            CONDITION_SCHEMA_READY,
            STATUS_TRUE,
            REASON_SKIPPED,
            MESSAGE_NO_SCHEMA,
        )
        .await
        .step(CONDITION_SCHEMA_READY, REASON_RECONCILIATION_FAILED)?;
    }

    // Creation forces paused and omits the schedule type; schema updates can
    // reset both
    let follow_up = needs.connector && (identity == RemoteIdentity::Unknown || needs.schema);
    if follow_up {
        if let Some(id) = connector_id.as_deref() {
            connector::update_connector(ctx, id, &resource.spec.connector, &resolved)
                .await
                .step(CONDITION_CONNECTOR_READY, REASON_RECONCILIATION_FAILED)?;
        }
    }

    finalize::clear_markers(ctx, resource).await?;
    info!("Reconciled {}", name);
    Ok(ReconcileOutcome::Done)
}
