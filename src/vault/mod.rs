//! # Vault
//!
//! Secret store abstraction and its HashiCorp Vault implementation.
//!
//! - `resolver.rs` - replaces `vault:<path>#<key>` references inside documents
//! - `client.rs` - AppRole login and KV v2 reads over HTTP
//! - `config.rs` - Vault connection settings read from a Kubernetes Secret
//! - `provider.rs` - per-namespace client cache
//! - `errors.rs` - [`VaultError`] and [`SecretStoreError`]

pub mod client;
pub mod config;
pub mod errors;
pub mod provider;
pub mod resolver;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use client::VaultClient;
pub use config::VaultSettings;
pub use errors::{SecretStoreError, VaultError, VaultErrorKind};
pub use provider::VaultClientManager;
pub use resolver::{SecretReference, SecretResolver};

/// Outcome of reading one secret path
#[derive(Debug, Clone, PartialEq)]
pub enum SecretRead {
    /// Key/value pairs stored at the path
    Found(BTreeMap<String, Value>),
    /// The path exists but carries no data (deleted or destroyed version)
    NoData,
    NotFound,
}

/// Read access to a key/value secret store
///
/// Implementations must be safe to share between concurrent reconciliations.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn read_secret(&self, path: &str) -> Result<SecretRead, SecretStoreError>;
}

/// Hands out an authenticated secret store for a namespace
#[async_trait]
pub trait SecretStoreProvider: Send + Sync {
    async fn store_for(&self, namespace: &str) -> anyhow::Result<Arc<dyn SecretStore>>;
}
