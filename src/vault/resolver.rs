//! # Secret Resolver
//!
//! Replaces every `vault:<path>#<key>` string inside a JSON document with the
//! value stored in the secret store.
//!
//! Resolution runs in three steps so no partially resolved document can ever
//! escape:
//!
//! 1. Walk the tree and parse every reference (malformed ones fail here).
//! 2. Fetch each distinct path once into the resolver's cache.
//! 3. Rebuild the tree with the referenced keys substituted.
//!
//! The cache lives as long as the [`SecretResolver`], which the reconciler
//! creates once per reconciliation and drops afterwards.

use crate::constants::VAULT_REFERENCE_PREFIX;
use crate::observability::metrics;
use crate::vault::errors::{VaultError, VaultErrorKind};
use crate::vault::{SecretRead, SecretStore};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Parsed `vault:<path>#<key>` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretReference {
    pub path: String,
    pub key: String,
}

impl SecretReference {
    /// Whether a string is meant to be a reference (well formed or not)
    #[must_use]
    pub fn is_reference(value: &str) -> bool {
        value.starts_with(VAULT_REFERENCE_PREFIX)
    }

    /// Parse a reference; both path and key must be non-empty
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let body = value.strip_prefix(VAULT_REFERENCE_PREFIX)?;
        let (path, key) = body.split_once('#')?;
        if path.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_string(),
            key: key.to_string(),
        })
    }
}

/// Reference found during the walk, with its location in the document
#[derive(Debug)]
struct PendingReference {
    key_path: String,
    raw: String,
    reference: SecretReference,
}

/// Resolves references against one secret store with a per-pass cache
pub struct SecretResolver<'a> {
    store: &'a dyn SecretStore,
    cache: HashMap<String, BTreeMap<String, Value>>,
    fetches: usize,
}

impl std::fmt::Debug for SecretResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("cached_paths", &self.cache.len())
            .field("fetches", &self.fetches)
            .finish_non_exhaustive()
    }
}

impl<'a> SecretResolver<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
            fetches: 0,
        }
    }

    /// Number of store reads performed so far
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Resolve every reference in `document`
    ///
    /// `root` names the document in error key paths (`config`, `auth`).
    ///
    /// # Errors
    /// Fails on the first malformed reference, unreadable path, empty secret
    /// or missing key. No partial result is returned.
    pub async fn resolve(&mut self, document: &Value, root: &str) -> Result<Value, VaultError> {
        let mut references = Vec::new();
        collect_references(document, root, &mut references)?;
        if references.is_empty() {
            return Ok(document.clone());
        }

        for pending in &references {
            self.fetch(pending).await?;
        }

        let resolved = self.substitute(document, root)?;
        debug!(
            document = root,
            references = references.len(),
            "vault.references.resolved"
        );
        Ok(resolved)
    }

    async fn fetch(&mut self, pending: &PendingReference) -> Result<(), VaultError> {
        let path = &pending.reference.path;
        if self.cache.contains_key(path) {
            return Ok(());
        }

        self.fetches += 1;
        metrics::increment_vault_reads();
        let read = self.store.read_secret(path).await.map_err(|e| {
            metrics::increment_vault_errors();
            VaultError::new(&pending.key_path, &pending.raw, VaultErrorKind::Store(e))
        })?;

        match read {
            SecretRead::Found(data) => {
                self.cache.insert(path.clone(), data);
                Ok(())
            }
            SecretRead::NoData => Err(VaultError::new(
                &pending.key_path,
                &pending.raw,
                VaultErrorKind::SecretDataNil { path: path.clone() },
            )),
            SecretRead::NotFound => Err(VaultError::new(
                &pending.key_path,
                &pending.raw,
                VaultErrorKind::SecretNotFound { path: path.clone() },
            )),
        }
    }

    fn substitute(&self, node: &Value, key_path: &str) -> Result<Value, VaultError> {
        match node {
            Value::Object(map) => {
                let mut resolved = Map::with_capacity(map.len());
                for (key, value) in map {
                    let child_path = format!("{key_path}.{key}");
                    resolved.insert(key.clone(), self.substitute(value, &child_path)?);
                }
                Ok(Value::Object(resolved))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| self.substitute(item, &format!("{key_path}[{index}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::String(raw) if SecretReference::is_reference(raw) => {
                let reference = SecretReference::parse(raw).ok_or_else(|| {
                    VaultError::new(key_path, raw, VaultErrorKind::InvalidReference)
                })?;
                let data = self.cache.get(&reference.path).ok_or_else(|| {
                    VaultError::new(
                        key_path,
                        raw,
                        VaultErrorKind::SecretNotFound {
                            path: reference.path.clone(),
                        },
                    )
                })?;
                data.get(&reference.key).cloned().ok_or_else(|| {
                    VaultError::new(
                        key_path,
                        raw,
                        VaultErrorKind::KeyNotFound {
                            path: reference.path.clone(),
                            key: reference.key.clone(),
                            available: data.keys().cloned().collect(),
                        },
                    )
                })
            }
            scalar => Ok(scalar.clone()),
        }
    }
}

fn collect_references(
    node: &Value,
    key_path: &str,
    out: &mut Vec<PendingReference>,
) -> Result<(), VaultError> {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                collect_references(value, &format!("{key_path}.{key}"), out)?;
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_references(item, &format!("{key_path}[{index}]"), out)?;
            }
        }
        Value::String(raw) if SecretReference::is_reference(raw) => {
            let reference = SecretReference::parse(raw).ok_or_else(|| {
                VaultError::new(key_path, raw, VaultErrorKind::InvalidReference)
            })?;
            out.push(PendingReference {
                key_path: key_path.to_string(),
                raw: raw.clone(),
                reference,
            });
        }
        Value::String(_) | Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}
