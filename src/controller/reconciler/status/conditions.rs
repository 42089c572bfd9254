//! # Conditions
//!
//! Conditions are kept in a map keyed by type while they are edited and
//! turned back into the status list only when status is written.

use crate::crd::Condition;
use std::collections::BTreeMap;

pub const STATUS_TRUE: &str = "True";
pub const STATUS_FALSE: &str = "False";
pub const STATUS_UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    conditions: BTreeMap<String, Condition>,
}

impl ConditionSet {
    #[must_use]
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        Self {
            conditions: conditions
                .iter()
                .map(|c| (c.r#type.clone(), c.clone()))
                .collect(),
        }
    }

    /// Insert or replace the condition of this type
    ///
    /// The transition time only moves when the status value changes.
    pub fn upsert(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
        now: &str,
    ) {
        let last_transition_time = self
            .conditions
            .get(condition_type)
            .filter(|existing| existing.status == status)
            .and_then(|existing| existing.last_transition_time.clone())
            .unwrap_or_else(|| now.to_string());

        self.conditions.insert(
            condition_type.to_string(),
            Condition {
                r#type: condition_type.to_string(),
                status: status.to_string(),
                last_transition_time: Some(last_transition_time),
                reason: Some(reason.to_string()),
                message: Some(message.to_string()),
            },
        );
    }

    #[must_use]
    pub fn get(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.get(condition_type)
    }

    /// Whether any condition is currently `False`
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.conditions.values().any(|c| c.status == STATUS_FALSE)
    }

    #[must_use]
    pub fn into_conditions(self) -> Vec<Condition> {
        self.conditions.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_by_type() {
        let mut set = ConditionSet::default();
        set.upsert("ConnectorReady", STATUS_FALSE, "ReconciliationFailed", "boom", "t1");
        set.upsert("ConnectorReady", STATUS_TRUE, "ReconciledSuccessfully", "ok", "t2");
        set.upsert("SchemaReady", STATUS_TRUE, "Skipped", "none", "t2");

        let conditions = set.into_conditions();
        assert_eq!(conditions.len(), 2);
        let ready = conditions
            .iter()
            .find(|c| c.r#type == "ConnectorReady")
            .unwrap();
        assert_eq!(ready.status, STATUS_TRUE);
        assert_eq!(ready.message.as_deref(), Some("ok"));
        assert_eq!(ready.last_transition_time.as_deref(), Some("t2"));
    }

    #[test]
    fn test_transition_time_kept_when_status_unchanged() {
        let mut set = ConditionSet::default();
        set.upsert("SchemaReady", STATUS_TRUE, "ReconciledSuccessfully", "ok", "t1");
        set.upsert("SchemaReady", STATUS_TRUE, "Skipped", "skipped", "t2");
        let condition = set.get("SchemaReady").unwrap();
        assert_eq!(condition.last_transition_time.as_deref(), Some("t1"));
        assert_eq!(condition.reason.as_deref(), Some("Skipped"));
    }

    #[test]
    fn test_has_failed() {
        let mut set = ConditionSet::default();
        assert!(!set.has_failed());
        set.upsert("ConnectorReady", STATUS_TRUE, "ReconciledSuccessfully", "ok", "t1");
        assert!(!set.has_failed());
        set.upsert("SetupTestReady", STATUS_FALSE, "ReconciliationFailed", "tests", "t1");
        assert!(set.has_failed());
    }
}
