//! # Trigger Gating
//!
//! The watch delivers an event for every write to a resource, including the
//! status and annotation writes the reconciler makes itself. The gate lets
//! through only the events that call for a pass:
//!
//! - first observation in this process
//! - a generation change
//! - a deletion timestamp, once, then only on retry
//! - the force-reconcile label, once per generation
//! - a retry scheduled by an earlier pass, once its delay has elapsed
//!
//! Events arriving before a retry is due are ignored like any other
//! status-only update; the requeue timer delivers the retry.

use crate::controller::reconciler::metadata;
use crate::controller::reconciler::TriggerSource;
use crate::crd::FivetranConnector;
use kube::ResourceExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct GateState {
    /// Last generation seen per resource
    observed: HashMap<String, i64>,
    /// Generation a force label was last honoured at
    forced: HashMap<String, i64>,
    /// Resources whose deletion has been handed to the reconciler
    deleting: HashSet<String>,
    /// When a scheduled retry becomes due
    retries: HashMap<String, Instant>,
}

#[derive(Debug, Default)]
pub struct TriggerGate {
    state: Mutex<GateState>,
}

/// `namespace/name`
#[must_use]
pub fn resource_key(resource: &FivetranConnector) -> String {
    format!(
        "{}/{}",
        resource.namespace().unwrap_or_default(),
        resource.name_any()
    )
}

impl TriggerGate {
    /// Decide whether this event warrants a pass, and why
    pub fn should_reconcile(&self, resource: &FivetranConnector) -> Option<TriggerSource> {
        self.should_reconcile_at(resource, Instant::now())
    }

    fn should_reconcile_at(
        &self,
        resource: &FivetranConnector,
        now: Instant,
    ) -> Option<TriggerSource> {
        let key = resource_key(resource);
        let generation = resource.metadata.generation.unwrap_or(0);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = state.observed.insert(key.clone(), generation);
        let retry = state.retries.get(&key).is_some_and(|due| *due <= now);

        let trigger = if resource.metadata.deletion_timestamp.is_some() {
            let first = state.deleting.insert(key.clone());
            (first || retry).then_some(TriggerSource::Deletion)
        } else if metadata::is_force_reconcile(resource)
            && state.forced.insert(key.clone(), generation) != Some(generation)
        {
            Some(TriggerSource::ForceReconcile)
        } else {
            if !metadata::is_force_reconcile(resource) {
                state.forced.remove(&key);
            }
            match previous {
                None => Some(TriggerSource::FirstObservation),
                Some(prev) if prev != generation => Some(TriggerSource::SpecChanged),
                _ if retry => Some(TriggerSource::Retry),
                _ => None,
            }
        };

        // Any pass that runs settles a pending retry
        if trigger.is_some() {
            state.retries.remove(&key);
        }
        trigger
    }

    /// Let the first event for this resource after `delay` through as a retry
    pub fn schedule_retry(&self, key: &str, delay: Duration) {
        self.schedule_retry_at(key, Instant::now() + delay);
    }

    fn schedule_retry_at(&self, key: &str, due: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.retries.insert(key.to_string(), due);
    }

    /// Drop everything remembered about a resource
    pub fn forget(&self, key: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.observed.remove(key);
        state.forced.remove(key);
        state.deleting.remove(key);
        state.retries.remove(key);
    }
}
