//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use anyhow::{Context, Result};
use std::time::Duration;
use zeroize::Zeroizing;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Fivetran REST API base URL
    pub fivetran_api_url: String,
    /// Per-request timeout applied by the Fivetran and Vault HTTP clients (seconds)
    pub http_timeout_secs: u64,
    /// Name of the Secret holding the Vault AppRole settings
    /// Looked up in the namespace of the reconciled resource
    pub vault_secret_name: String,
    /// Minimum remaining Vault token TTL before re-authenticating (seconds)
    pub vault_min_token_ttl_secs: u64,
    /// Requeue interval for retryable Vault and Fivetran failures (seconds)
    pub retryable_error_requeue_secs: u64,
    /// Reconciliation error requeue interval (seconds)
    /// How long to wait before retrying an error the engine returned unclassified
    pub reconciliation_error_requeue_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Restrict the watch to a single namespace (all namespaces when unset)
    pub watch_namespace: Option<String>,
    /// HTTP server port for metrics and probes
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to bind (seconds)
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            fivetran_api_url: DEFAULT_FIVETRAN_API_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            vault_secret_name: DEFAULT_VAULT_SECRET_NAME.to_string(),
            vault_min_token_ttl_secs: DEFAULT_VAULT_MIN_TOKEN_TTL_SECS,
            retryable_error_requeue_secs: DEFAULT_RETRYABLE_ERROR_REQUEUE_SECS,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            watch_namespace: None,
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            fivetran_api_url: env_var_or_default_str("FIVETRAN_API_URL", DEFAULT_FIVETRAN_API_URL),
            http_timeout_secs: env_var_or_default(
                "FIVETRAN_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            vault_secret_name: env_var_or_default_str(
                "FIVETRAN_VAULT_SECRET_NAME",
                DEFAULT_VAULT_SECRET_NAME,
            ),
            vault_min_token_ttl_secs: env_var_or_default(
                "VAULT_MIN_TOKEN_TTL_SECS",
                DEFAULT_VAULT_MIN_TOKEN_TTL_SECS,
            ),
            retryable_error_requeue_secs: env_var_or_default(
                "RETRYABLE_ERROR_REQUEUE_SECS",
                DEFAULT_RETRYABLE_ERROR_REQUEUE_SECS,
            ),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty()),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            server_startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "json"),
        }
    }

    /// Get the per-request HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Get the requeue delay for retryable failures
    pub fn retryable_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.retryable_error_requeue_secs)
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get watch restart delay after end duration
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }

    /// Get the minimum remaining Vault token lifetime
    pub fn vault_min_token_ttl(&self) -> Duration {
        Duration::from_secs(self.vault_min_token_ttl_secs)
    }
}

/// Fivetran API key pair used for basic authentication
pub struct FivetranCredentials {
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
}

impl std::fmt::Debug for FivetranCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FivetranCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

impl FivetranCredentials {
    /// Read `FIVETRAN_API_KEY` and `FIVETRAN_API_SECRET`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("FIVETRAN_API_KEY")
            .context("FIVETRAN_API_KEY environment variable is not set")?;
        let api_secret = std::env::var("FIVETRAN_API_SECRET")
            .context("FIVETRAN_API_SECRET environment variable is not set")?;
        if api_key.is_empty() || api_secret.is_empty() {
            anyhow::bail!("FIVETRAN_API_KEY and FIVETRAN_API_SECRET must not be empty");
        }
        Ok(Self {
            api_key,
            api_secret: Zeroizing::new(api_secret),
        })
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
