//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `fivetran_operator_reconciliations_total` - Reconciliations by trigger
//! - `fivetran_operator_reconciliation_errors_total` - Reconciliations that returned an error
//! - `fivetran_operator_reconciliation_duration_seconds` - Duration of reconciliations
//! - `fivetran_operator_requeues_total` - Requeues by reason
//! - `fivetran_operator_fivetran_operations_total` - Fivetran API calls by operation
//! - `fivetran_operator_fivetran_operation_errors_total` - Failed Fivetran API calls by operation
//! - `fivetran_operator_fivetran_operation_duration_seconds` - Duration of Fivetran API calls
//! - `fivetran_operator_vault_reads_total` - Vault KV reads
//! - `fivetran_operator_vault_errors_total` - Failed Vault KV reads
//! - `fivetran_operator_schema_drift_retries_total` - Schema reload-and-reapply cycles
//! - `fivetran_operator_schema_mismatch_total` - Schemas still mismatched after the retry
//! - `fivetran_operator_connector_operations_total` - Connector create/update/adopt/delete

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "fivetran_operator_reconciliations_total",
            "Total number of reconciliations by trigger",
        ),
        &["trigger"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "fivetran_operator_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "fivetran_operator_reconciliation_duration_seconds",
            "Duration of reconciliation operations in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "fivetran_operator_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static FIVETRAN_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "fivetran_operator_fivetran_operations_total",
            "Total number of Fivetran API operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create FIVETRAN_OPERATIONS_TOTAL metric - this should never happen")
});

static FIVETRAN_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "fivetran_operator_fivetran_operation_errors_total",
            "Total number of failed Fivetran API operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create FIVETRAN_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static FIVETRAN_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "fivetran_operator_fivetran_operation_duration_seconds",
            "Duration of Fivetran API operations in seconds by operation",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .expect("Failed to create FIVETRAN_OPERATION_DURATION metric - this should never happen")
});

static VAULT_READS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "fivetran_operator_vault_reads_total",
        "Total number of Vault KV reads",
    )
    .expect("Failed to create VAULT_READS_TOTAL metric - this should never happen")
});

static VAULT_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "fivetran_operator_vault_errors_total",
        "Total number of failed Vault KV reads",
    )
    .expect("Failed to create VAULT_ERRORS_TOTAL metric - this should never happen")
});

static SCHEMA_DRIFT_RETRIES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "fivetran_operator_schema_drift_retries_total",
        "Total number of schema reload and reapply cycles after a mismatch",
    )
    .expect("Failed to create SCHEMA_DRIFT_RETRIES_TOTAL metric - this should never happen")
});

static SCHEMA_MISMATCH_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "fivetran_operator_schema_mismatch_total",
        "Total number of schema configurations still mismatched after the retry",
    )
    .expect("Failed to create SCHEMA_MISMATCH_TOTAL metric - this should never happen")
});

static CONNECTOR_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "fivetran_operator_connector_operations_total",
            "Total number of connector lifecycle operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create CONNECTOR_OPERATIONS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register all metrics with the registry
///
/// # Errors
/// Returns an error if a metric is registered twice
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FIVETRAN_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FIVETRAN_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(FIVETRAN_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_READS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCHEMA_DRIFT_RETRIES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SCHEMA_MISMATCH_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CONNECTOR_OPERATIONS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(trigger: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[trigger]).inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_fivetran_operations(operation: &str) {
    FIVETRAN_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_fivetran_operation_errors(operation: &str) {
    FIVETRAN_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn observe_fivetran_operation_duration(operation: &str, duration: f64) {
    FIVETRAN_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_vault_reads() {
    VAULT_READS_TOTAL.inc();
}

pub fn increment_vault_errors() {
    VAULT_ERRORS_TOTAL.inc();
}

pub fn increment_schema_drift_retries() {
    SCHEMA_DRIFT_RETRIES_TOTAL.inc();
}

pub fn increment_schema_mismatches() {
    SCHEMA_MISMATCH_TOTAL.inc();
}

/// `operation` is one of `create`, `update`, `adopt`, `delete`
pub fn increment_connector_operations(operation: &str) {
    CONNECTOR_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations_by_trigger() {
        let before = RECONCILIATIONS_TOTAL.with_label_values(&["spec_changed"]).get();
        increment_reconciliations("spec_changed");
        let after = RECONCILIATIONS_TOTAL.with_label_values(&["spec_changed"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        let after = RECONCILIATION_ERRORS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(1.5);
        assert_eq!(RECONCILIATION_DURATION.get_sample_count(), before + 1);
    }

    #[test]
    fn test_increment_requeues() {
        let before = REQUEUES_TOTAL.with_label_values(&["retryable_error"]).get();
        increment_requeues("retryable_error");
        let after = REQUEUES_TOTAL.with_label_values(&["retryable_error"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_fivetran_operation_metrics_are_labelled() {
        let before_ops = FIVETRAN_OPERATIONS_TOTAL
            .with_label_values(&["get_connector"])
            .get();
        let before_errors = FIVETRAN_OPERATION_ERRORS_TOTAL
            .with_label_values(&["get_connector"])
            .get();
        increment_fivetran_operations("get_connector");
        increment_fivetran_operation_errors("get_connector");
        observe_fivetran_operation_duration("get_connector", 0.2);

        assert_eq!(
            FIVETRAN_OPERATIONS_TOTAL
                .with_label_values(&["get_connector"])
                .get(),
            before_ops + 1u64
        );
        assert_eq!(
            FIVETRAN_OPERATION_ERRORS_TOTAL
                .with_label_values(&["get_connector"])
                .get(),
            before_errors + 1u64
        );
    }

    #[test]
    fn test_increment_vault_reads_and_errors() {
        let reads = VAULT_READS_TOTAL.get();
        let errors = VAULT_ERRORS_TOTAL.get();
        increment_vault_reads();
        increment_vault_errors();
        assert_eq!(VAULT_READS_TOTAL.get(), reads + 1u64);
        assert_eq!(VAULT_ERRORS_TOTAL.get(), errors + 1u64);
    }

    #[test]
    fn test_schema_drift_counters() {
        let retries = SCHEMA_DRIFT_RETRIES_TOTAL.get();
        let mismatches = SCHEMA_MISMATCH_TOTAL.get();
        increment_schema_drift_retries();
        increment_schema_mismatches();
        assert_eq!(SCHEMA_DRIFT_RETRIES_TOTAL.get(), retries + 1u64);
        assert_eq!(SCHEMA_MISMATCH_TOTAL.get(), mismatches + 1u64);
    }

    #[test]
    fn test_increment_connector_operations() {
        let before = CONNECTOR_OPERATIONS_TOTAL.with_label_values(&["adopt"]).get();
        increment_connector_operations("adopt");
        let after = CONNECTOR_OPERATIONS_TOTAL.with_label_values(&["adopt"]).get();
        assert_eq!(after, before + 1u64);
    }
}
