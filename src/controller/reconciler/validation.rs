//! # Spec Validation
//!
//! Rules checked before any remote call. The CRD enforces the same rules at
//! admission time, but resources written before the CRD was upgraded (or
//! with validation disabled) still reach the reconciler.

use crate::constants::{ALLOWED_SYNC_FREQUENCIES, DAILY_SYNC_FREQUENCY};
use crate::controller::reconciler::error::ReconcilerError;
use crate::crd::ConnectorSpec;
use regex::Regex;

/// Whole hours only
pub const DAILY_SYNC_TIME_PATTERN: &str = "^([0-1]?[0-9]|2[0-3]):00$";

/// # Errors
/// Returns [`ReconcilerError::Validation`] naming every violated rule
pub fn validate_connector_spec(spec: &ConnectorSpec) -> Result<(), ReconcilerError> {
    let mut violations = Vec::new();

    if spec.service.trim().is_empty() {
        violations.push("service must not be empty".to_string());
    }
    if spec.group_id.trim().is_empty() {
        violations.push("group_id must not be empty".to_string());
    }

    if let Some(frequency) = spec.sync_frequency {
        if !ALLOWED_SYNC_FREQUENCIES.contains(&frequency) {
            violations.push(format!(
                "sync_frequency {frequency} is not one of {ALLOWED_SYNC_FREQUENCIES:?}"
            ));
        }
    }

    if let Some(time) = spec.daily_sync_time.as_deref() {
        let pattern = Regex::new(DAILY_SYNC_TIME_PATTERN)
            .map_err(|e| ReconcilerError::Internal(e.into()))?;
        if !pattern.is_match(time) {
            violations.push(format!(
                "daily_sync_time '{time}' must match {DAILY_SYNC_TIME_PATTERN}"
            ));
        }
        if spec.sync_frequency != Some(DAILY_SYNC_FREQUENCY) {
            violations.push(format!(
                "daily_sync_time can only be set when sync_frequency is {DAILY_SYNC_FREQUENCY}"
            ));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ReconcilerError::Validation(violations.join("; ")))
    }
}
