//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::reconciler::store::ResourceStore;
use crate::fivetran::FivetranApi;
use crate::runtime::trigger::TriggerGate;
use crate::vault::SecretStoreProvider;
use std::sync::Arc;
use std::time::Duration;

/// Trigger source for reconciliation
/// Tracks why a reconciliation was triggered for better debugging and observability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// First time this process sees the resource
    FirstObservation,
    /// metadata.generation moved
    SpecChanged,
    /// Force-reconcile label present (fivetranctl reconcile)
    ForceReconcile,
    /// Deletion timestamp set
    Deletion,
    /// Requeue scheduled by an earlier pass
    Retry,
}

impl TriggerSource {
    /// Get human-readable string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::FirstObservation => "first-observation",
            TriggerSource::SpecChanged => "spec-changed",
            TriggerSource::ForceReconcile => "force-reconcile",
            TriggerSource::Deletion => "deletion",
            TriggerSource::Retry => "retry",
        }
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing changed since the last applied state
    NoOp,
    /// Transient failure, run again after the delay
    RequeueAfter(Duration),
    /// Finished; success and terminal failure differ only in the recorded conditions
    Done,
}

/// Shared reconciliation context
///
/// The three collaborators are trait objects so the engine can run against
/// the Kubernetes API, Fivetran and Vault, or against in-memory fakes.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn ResourceStore>,
    pub fivetran: Arc<dyn FivetranApi>,
    pub secrets: Arc<dyn SecretStoreProvider>,
    pub config: ControllerConfig,
    /// Watch event gating, owned by the runtime
    pub triggers: Arc<TriggerGate>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        fivetran: Arc<dyn FivetranApi>,
        secrets: Arc<dyn SecretStoreProvider>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            fivetran,
            secrets,
            config,
            triggers: Arc::new(TriggerGate::default()),
        }
    }
}
