//! # Reconciler Errors
//!
//! Error taxonomy of a reconciliation pass and how each class is handled.

use crate::controller::reconciler::store::StoreError;
use crate::fivetran::{ApiError, SchemaBuildError};
use crate::vault::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Declared state that can never be applied as written
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Secret(#[from] VaultError),

    #[error("vault client initialization failed: {0:#}")]
    SecretStoreUnavailable(#[source] anyhow::Error),

    #[error("{context}: {source}")]
    Api {
        context: String,
        #[source]
        source: ApiError,
    },

    #[error("schema configuration does not match the source after retry: {report}")]
    SchemaMismatchAfterRetry { report: String },

    #[error("setup tests failed: {0}")]
    SetupTestsFailed(String),

    #[error("invalid schema configuration: {0}")]
    SchemaBuild(#[from] SchemaBuildError),

    #[error("adoption of existing connector failed: {0}")]
    Adoption(#[source] Box<ReconcilerError>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("reconciliation failed: {0:#}")]
    Internal(#[from] anyhow::Error),
}

/// What the orchestrator does with a failed pass once the condition is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient, retry after the configured delay
    Requeue,
    /// Recorded in status, not retried until the resource changes
    Terminal,
    /// Handed back to the runtime's error policy
    Propagate,
}

impl ReconcilerError {
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Validation(_)
            | Self::SchemaMismatchAfterRetry { .. }
            | Self::SetupTestsFailed(_)
            | Self::SchemaBuild(_) => Disposition::Terminal,
            Self::Secret(e) if e.is_retryable() => Disposition::Requeue,
            Self::Secret(_) => Disposition::Terminal,
            Self::Api { source, .. } if source.is_retryable() => Disposition::Requeue,
            Self::Api { .. } => Disposition::Terminal,
            Self::Adoption(inner) => inner.disposition(),
            Self::SecretStoreUnavailable(_) | Self::Store(_) | Self::Internal(_) => {
                Disposition::Propagate
            }
        }
    }
}

/// A failed step together with the condition it is reported on
#[derive(Debug)]
pub struct FailedStep {
    pub condition: &'static str,
    pub reason: &'static str,
    pub error: ReconcilerError,
}

impl FailedStep {
    pub fn new(condition: &'static str, reason: &'static str, error: impl Into<ReconcilerError>) -> Self {
        Self {
            condition,
            reason,
            error: error.into(),
        }
    }
}

/// Attach the condition and reason a failure should be reported on
pub(crate) trait StepContext<T> {
    fn step(self, condition: &'static str, reason: &'static str) -> Result<T, FailedStep>;
}

impl<T, E: Into<ReconcilerError>> StepContext<T> for Result<T, E> {
    fn step(self, condition: &'static str, reason: &'static str) -> Result<T, FailedStep> {
        self.map_err(|e| FailedStep::new(condition, reason, e))
    }
}
