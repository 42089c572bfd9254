//! # Fivetran API Errors
//!
//! Typed error for every failed Fivetran REST call.

use crate::constants::SCHEMA_NOT_FOUND_CODE;
use thiserror::Error;

/// Status code used when the request never produced an HTTP response
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Error returned by the Fivetran API or the transport underneath it
///
/// Retryability is derived from the status code alone: 429 and 5xx are
/// retryable, any other 4xx is terminal, everything else (including
/// transport failures, which carry status 0) is treated as retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fivetran api error (status {status_code}): {code} - {message}")]
pub struct ApiError {
    pub status_code: u16,
    /// Provider-reported code such as `NotFound_SchemaConfig`, empty when absent
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status_code: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure that happened before any response was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(TRANSPORT_FAILURE_STATUS, "TransportError", message)
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.status_code {
            429 => true,
            400..=499 => false,
            _ => true,
        }
    }

    /// The connector exists but Fivetran has not built its schema configuration yet
    #[must_use]
    pub fn is_schema_not_found(&self) -> bool {
        self.code == SCHEMA_NOT_FOUND_CODE
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}
