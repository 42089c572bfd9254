//! # Vault Errors
//!
//! Secret resolution failures and the transport errors underneath them.

use thiserror::Error;

/// Failure talking to the secret store itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretStoreError {
    #[error("vault request failed: {0}")]
    Transport(String),
    #[error("vault returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("vault login failed: {0}")]
    Authentication(String),
}

/// Why a single reference could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultErrorKind {
    #[error("invalid vault reference format (expected format: vault:path#key)")]
    InvalidReference,
    #[error("secret not found at path '{path}'")]
    SecretNotFound { path: String },
    #[error("secret data is nil at path '{path}'")]
    SecretDataNil { path: String },
    #[error(
        "key not found in vault secret '{key}' at path '{path}' (available keys: [{}])",
        .available.join(", ")
    )]
    KeyNotFound {
        path: String,
        key: String,
        available: Vec<String>,
    },
    #[error("failed to read vault secret: {0}")]
    Store(#[source] SecretStoreError),
}

/// Structured secret resolution error
///
/// `key_path` locates the offending value inside the resolved document
/// (`config.credentials[0].password`). The retryable flag is decided where the
/// error is raised: only store transport failures can heal on their own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key_path}: vault reference '{reference}': {kind}")]
pub struct VaultError {
    pub key_path: String,
    pub reference: String,
    pub kind: VaultErrorKind,
    pub retryable: bool,
}

impl VaultError {
    pub fn new(
        key_path: impl Into<String>,
        reference: impl Into<String>,
        kind: VaultErrorKind,
    ) -> Self {
        let retryable = matches!(kind, VaultErrorKind::Store(_));
        Self {
            key_path: key_path.into(),
            reference: reference.into(),
            kind,
            retryable,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}
