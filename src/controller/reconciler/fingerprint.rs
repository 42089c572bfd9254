//! # Fingerprints
//!
//! Stable digests of the declared connector and schema configuration.
//!
//! Documents are rendered as compact JSON through [`serde_json::Value`] and
//! hashed with MD5. `Value` objects keep their keys sorted as long as
//! serde_json's `preserve_order` feature stays off, so two documents that
//! differ only in key order share a fingerprint while any changed leaf value
//! produces a different one.

use crate::crd::{ConnectorSpec, SchemaSpec};
use serde::Serialize;
use serde_json::Value;

/// Fingerprint recorded when no schema configuration is declared
///
/// Never a valid hex digest, so it cannot collide with a real fingerprint.
pub const NO_SCHEMA_FINGERPRINT: &str = "no-schema-declared";

/// Digest of any serializable document
///
/// # Errors
/// Returns an error if the document cannot be represented as JSON
pub fn fingerprint<T: Serialize + ?Sized>(document: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(document)?;
    let canonical = serde_json::to_vec(&value)?;
    Ok(format!("{:x}", md5::compute(canonical)))
}

/// Whether `current` differs from the stored fingerprint (absent counts as changed)
#[must_use]
pub fn changed(current: &str, stored: Option<&str>) -> bool {
    stored != Some(current)
}

/// Fingerprint of the declared connector settings (before secret resolution)
///
/// # Errors
/// Returns an error if the spec cannot be represented as JSON
pub fn connector_fingerprint(spec: &ConnectorSpec) -> Result<String, serde_json::Error> {
    fingerprint(spec)
}

/// Fingerprint of the declared schema, or [`NO_SCHEMA_FINGERPRINT`]
///
/// # Errors
/// Returns an error if the schema cannot be represented as JSON
pub fn schema_fingerprint(spec: Option<&SchemaSpec>) -> Result<String, serde_json::Error> {
    match spec.filter(|schema| schema.is_declared()) {
        Some(schema) => fingerprint(schema),
        None => Ok(NO_SCHEMA_FINGERPRINT.to_string()),
    }
}
