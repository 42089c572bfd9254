//! # Initialization
//!
//! Controller start-up: rustls provider, tracing, metrics, HTTP server,
//! Kubernetes client and the reconciler's collaborators.

use crate::config::{ControllerConfig, FivetranCredentials};
use crate::controller::reconciler::{KubeResourceStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::FivetranConnector;
use crate::fivetran::FivetranClient;
use crate::observability;
use crate::vault::VaultClientManager;
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    /// Watched `FivetranConnector` API, cluster-wide or one namespace
    pub connectors: Api<FivetranConnector>,
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.reconciler.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// # Errors
/// Fails when credentials are missing, metrics cannot be registered, the
/// HTTP server does not come up or no Kubernetes client can be built
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = ControllerConfig::from_env();
    init_tracing(&config);

    info!("Starting Fivetran Operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!("Configuration: {:?}", config);

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(
        &server_state,
        &server_handle,
        Duration::from_secs(config.server_startup_timeout_secs),
        Duration::from_millis(config.server_poll_interval_ms),
    )
    .await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let connectors: Api<FivetranConnector> = match &config.watch_namespace {
        Some(namespace) => {
            info!("Watching FivetranConnector resources in namespace '{}'", namespace);
            Api::namespaced(client.clone(), namespace)
        }
        None => {
            info!("Watching FivetranConnector resources in all namespaces");
            Api::all(client.clone())
        }
    };

    let credentials =
        FivetranCredentials::from_env().context("Failed to load Fivetran API credentials")?;
    let fivetran = FivetranClient::new(&config.fivetran_api_url, credentials, config.http_timeout())
        .context("Failed to create Fivetran client")?;
    let secrets = VaultClientManager::new(
        client.clone(),
        &config.vault_secret_name,
        config.http_timeout(),
        config.vault_min_token_ttl(),
    );
    let store = KubeResourceStore::new(client.clone());

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(store),
        Arc::new(fivetran),
        Arc::new(secrets),
        config,
    ));

    info!("Operator initialized, watching FivetranConnector resources");
    Ok(InitializationResult {
        client,
        connectors,
        reconciler,
        server_state,
    })
}

/// `RUST_LOG` wins; otherwise `fivetran_operator=<LOG_LEVEL>`
fn init_tracing(config: &ControllerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("fivetran_operator={}", config.log_level.to_lowercase()).into()
    });

    if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    startup_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}
