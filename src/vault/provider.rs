//! # Vault Client Manager
//!
//! Caches one [`VaultClient`] per namespace. A cached client is reused while
//! its token is valid; otherwise the settings Secret is read again and a new
//! client logs in, which also picks up rotated AppRole credentials.

use crate::vault::client::VaultClient;
use crate::vault::config::VaultSettings;
use crate::vault::{SecretStore, SecretStoreProvider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

/// Client slot of one namespace; locked while that namespace connects
type ClientSlot = Arc<AsyncMutex<Option<Arc<VaultClient>>>>;

pub struct VaultClientManager {
    client: Client,
    secret_name: String,
    timeout: Duration,
    min_token_ttl: Duration,
    clients: Mutex<HashMap<String, ClientSlot>>,
}

impl std::fmt::Debug for VaultClientManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClientManager")
            .field("secret_name", &self.secret_name)
            .finish_non_exhaustive()
    }
}

impl VaultClientManager {
    pub fn new(
        client: Client,
        secret_name: impl Into<String>,
        timeout: Duration,
        min_token_ttl: Duration,
    ) -> Self {
        Self {
            client,
            secret_name: secret_name.into(),
            timeout,
            min_token_ttl,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, namespace: &str) -> ClientSlot {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(clients.entry(namespace.to_string()).or_default())
    }

    async fn connect(&self, namespace: &str) -> Result<VaultClient> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets.get(&self.secret_name).await.with_context(|| {
            format!(
                "Failed to read Vault secret '{}' in namespace '{}'",
                self.secret_name, namespace
            )
        })?;

        let settings = VaultSettings::from_secret(&secret)?;
        let client = VaultClient::new(settings, self.timeout, self.min_token_ttl)?;
        client
            .login()
            .await
            .context("Failed to authenticate with Vault")?;
        Ok(client)
    }
}

#[async_trait]
impl SecretStoreProvider for VaultClientManager {
    async fn store_for(&self, namespace: &str) -> Result<Arc<dyn SecretStore>> {
        let slot = self.slot(namespace);
        let mut cached = slot.lock().await;
        if let Some(existing) = cached.as_ref() {
            if existing.has_valid_token().await {
                let store: Arc<VaultClient> = Arc::clone(existing);
                return Ok(store);
            }
        }

        info!(namespace = namespace, "Initializing Vault client");
        let client = Arc::new(self.connect(namespace).await?);
        *cached = Some(Arc::clone(&client));
        Ok(client)
    }
}
