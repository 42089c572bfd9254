//! # Error Policy
//!
//! Errors the reconciler could not settle itself (store failures, Vault
//! client initialization, anything unclassified) end up here.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::FivetranConnector;
use crate::observability;
use crate::runtime::trigger::resource_key;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Requeue the resource after the configured reconciliation error delay
pub fn handle_reconciliation_error(
    obj: Arc<FivetranConnector>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconcile.error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    observability::metrics::increment_reconciliation_errors();
    observability::metrics::increment_requeues("reconciliation-error");

    let delay = ctx.config.reconciliation_error_requeue_duration();
    ctx.triggers.schedule_retry(&resource_key(&obj), delay);
    info!("Retrying {}/{} in {}s", namespace, name, delay.as_secs());
    Action::requeue(delay)
}

/// Log a watch stream error; the stream keeps running
pub fn handle_watch_stream_error(error: &dyn std::fmt::Debug) {
    warn!("Controller watch stream error: {:?}", error);
}
