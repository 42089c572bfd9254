//! # Vault Client
//!
//! AppRole-authenticated KV v2 reader.
//!
//! The client logs in lazily and re-authenticates whenever the cached token's
//! remaining lifetime drops below the configured minimum, so a single instance
//! can be shared by every reconciliation in a namespace.

use crate::vault::config::VaultSettings;
use crate::vault::errors::SecretStoreError;
use crate::vault::{SecretRead, SecretStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, Instrument};
use zeroize::Zeroizing;

struct VaultToken {
    value: Zeroizing<String>,
    /// `None` for tokens without a lease
    expires_at: Option<Instant>,
}

impl VaultToken {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires_at| expires_at.saturating_duration_since(now))
    }

    fn is_usable(&self, min_ttl: Duration) -> bool {
        self.remaining(Instant::now())
            .is_none_or(|remaining| remaining > min_ttl)
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
    #[serde(default)]
    lease_duration: u64,
}

/// `GET /v1/<mount>/data/<path>` response
#[derive(Debug, Deserialize)]
struct KvReadResponse {
    #[serde(default)]
    data: Option<KvData>,
}

#[derive(Debug, Deserialize)]
struct KvData {
    #[serde(default)]
    data: Option<BTreeMap<String, Value>>,
}

pub struct VaultClient {
    http_client: Client,
    settings: VaultSettings,
    min_token_ttl: Duration,
    token: RwLock<Option<VaultToken>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.settings.address)
            .field("mount_path", &self.settings.mount_path)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(settings: VaultSettings, timeout: Duration, min_token_ttl: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http_client,
            settings,
            min_token_ttl,
            token: RwLock::new(None),
        })
    }

    /// Whether the cached token is present and outlives the minimum TTL
    pub async fn has_valid_token(&self) -> bool {
        self.token
            .read()
            .await
            .as_ref()
            .is_some_and(|token| token.is_usable(self.min_token_ttl))
    }

    /// Log in with AppRole and cache the token
    ///
    /// # Errors
    /// Returns [`SecretStoreError::Authentication`] when Vault rejects the
    /// credentials and [`SecretStoreError::Transport`] when it cannot be reached
    pub async fn login(&self) -> Result<(), SecretStoreError> {
        let token = self.request_token().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn request_token(&self) -> Result<VaultToken, SecretStoreError> {
        let url = format!("{}/v1/auth/approle/login", self.settings.address);
        let body = serde_json::json!({
            "role_id": self.settings.role_id,
            "secret_id": self.settings.secret_id.as_str(),
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SecretStoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SecretStoreError::Authentication(format!(
                "status {}: {}",
                status.as_u16(),
                message
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| SecretStoreError::Authentication(format!("invalid login response: {e}")))?;

        info!(
            lease_duration_secs = login.auth.lease_duration,
            "vault.approle.login"
        );
        Ok(VaultToken {
            value: Zeroizing::new(login.auth.client_token),
            expires_at: (login.auth.lease_duration > 0)
                .then(|| Instant::now() + Duration::from_secs(login.auth.lease_duration)),
        })
    }

    /// Current token, logging in again when it is missing or about to expire
    async fn token(&self) -> Result<Zeroizing<String>, SecretStoreError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| t.is_usable(self.min_token_ttl)) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_usable(self.min_token_ttl)) {
            return Ok(token.value.clone());
        }
        debug!("Vault token expired or missing, logging in with AppRole");
        let token = self.request_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn read_secret(&self, path: &str) -> Result<SecretRead, SecretStoreError> {
        let span = tracing::debug_span!("vault.kv.read", secret.path = path);
        async move {
            let token = self.token().await?;
            let url = format!(
                "{}/v1/{}/data/{}",
                self.settings.address,
                self.settings.mount_path,
                path.trim_start_matches('/')
            );

            let response = self
                .http_client
                .get(&url)
                .header("X-Vault-Token", token.as_str())
                .send()
                .await
                .map_err(|e| SecretStoreError::Transport(e.to_string()))?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(SecretRead::NotFound),
                status if status.is_success() => {
                    let body: KvReadResponse = response
                        .json()
                        .await
                        .map_err(|e| SecretStoreError::Transport(format!("invalid KV response: {e}")))?;
                    Ok(match body.data.and_then(|d| d.data) {
                        Some(data) => SecretRead::Found(data),
                        None => SecretRead::NoData,
                    })
                }
                status => {
                    if status == StatusCode::FORBIDDEN {
                        // Revoked or expired early, force a fresh login on the next read
                        *self.token.write().await = None;
                    }
                    Err(SecretStoreError::Status {
                        status: status.as_u16(),
                        message: response.text().await.unwrap_or_default(),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }
}
