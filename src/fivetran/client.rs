//! # Fivetran REST Client
//!
//! reqwest-based implementation of [`FivetranApi`] against `https://api.fivetran.com/v1`.
//!
//! Authentication is HTTP basic auth with the account's API key and secret.
//! Every non-2xx response is decoded into an [`ApiError`] carrying the HTTP
//! status and Fivetran's `code`/`message` pair; transport failures surface as
//! status 0 so they classify as retryable.

use crate::config::FivetranCredentials;
use crate::fivetran::errors::ApiError;
use crate::fivetran::types::{
    ApiResponse, ConnectorDetails, CreateConnectorRequest, ErrorBody, ExcludeMode,
    ReloadSchemaRequest, SchemaConfigRequest, SchemaDetails, SetupTestResult,
    SetupTestsRequest, UpdateConnectorRequest,
};
use crate::fivetran::FivetranApi;
use crate::observability::metrics;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, Instrument};
use zeroize::Zeroizing;

const ACCEPT_HEADER: &str = "application/json;version=2";

pub struct FivetranClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    api_secret: Zeroizing<String>,
}

impl std::fmt::Debug for FivetranClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FivetranClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl FivetranClient {
    /// Create a client for the given API base URL
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        base_url: impl Into<String>,
        credentials: FivetranCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: credentials.api_key,
            api_secret: credentials.api_secret,
        })
    }

    /// Build HTTP request with authentication headers
    fn make_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/v1/{}", self.base_url, path);
        self.http_client
            .request(method, url)
            .basic_auth(&self.api_key, Some(self.api_secret.as_str()))
            .header("Accept", ACCEPT_HEADER)
    }

    /// Send a request and decode the `data` member of the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let start = Instant::now();
        let result = async {
            let body = execute(request).await?;
            let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
                ApiError::transport(format!("failed to decode {operation} response: {e}"))
            })?;
            envelope.data.ok_or_else(|| {
                ApiError::transport(format!(
                    "{operation} response carried no data (code: {}, message: {})",
                    envelope.code, envelope.message
                ))
            })
        }
        .instrument(tracing::debug_span!("fivetran.api", operation = operation))
        .await;

        record(operation, start, result.as_ref().err());
        result
    }

    /// Send a request whose response body is irrelevant
    async fn send_without_data(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(), ApiError> {
        let start = Instant::now();
        let result = execute(request)
            .instrument(tracing::debug_span!("fivetran.api", operation = operation))
            .await
            .map(|_| ());
        record(operation, start, result.as_ref().err());
        result
    }
}

async fn execute(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::transport(e.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))?;

    if status.is_success() {
        return Ok(body);
    }

    debug!(status = status.as_u16(), "Fivetran API returned an error response");
    let error_body: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = if error_body.message.is_empty() {
        body
    } else {
        error_body.message
    };
    Err(ApiError::new(status.as_u16(), error_body.code, message))
}

fn record(operation: &'static str, start: Instant, error: Option<&ApiError>) {
    metrics::increment_fivetran_operations(operation);
    metrics::observe_fivetran_operation_duration(operation, start.elapsed().as_secs_f64());
    if let Some(err) = error {
        metrics::increment_fivetran_operation_errors(operation);
        debug!(operation = operation, error = %err, "Fivetran API call failed");
    }
}

#[async_trait]
impl FivetranApi for FivetranClient {
    async fn create_connector(
        &self,
        request: &CreateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError> {
        self.send(
            "create_connector",
            self.make_request(Method::POST, "connections").json(request),
        )
        .await
    }

    async fn get_connector(&self, connector_id: &str) -> Result<ConnectorDetails, ApiError> {
        self.send(
            "get_connector",
            self.make_request(Method::GET, &format!("connections/{connector_id}")),
        )
        .await
    }

    async fn update_connector(
        &self,
        connector_id: &str,
        request: &UpdateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError> {
        self.send(
            "update_connector",
            self.make_request(Method::PATCH, &format!("connections/{connector_id}"))
                .json(request),
        )
        .await
    }

    async fn delete_connector(&self, connector_id: &str) -> Result<(), ApiError> {
        self.send_without_data(
            "delete_connector",
            self.make_request(Method::DELETE, &format!("connections/{connector_id}")),
        )
        .await
    }

    async fn run_setup_tests(
        &self,
        connector_id: &str,
        request: &SetupTestsRequest,
    ) -> Result<Vec<SetupTestResult>, ApiError> {
        let details: ConnectorDetails = self
            .send(
                "run_setup_tests",
                self.make_request(Method::POST, &format!("connections/{connector_id}/test"))
                    .json(request),
            )
            .await?;
        Ok(details.setup_tests)
    }

    async fn get_schema_details(&self, connector_id: &str) -> Result<SchemaDetails, ApiError> {
        self.send(
            "get_schema_details",
            self.make_request(Method::GET, &format!("connections/{connector_id}/schemas")),
        )
        .await
    }

    async fn update_schema(
        &self,
        connector_id: &str,
        request: &SchemaConfigRequest,
    ) -> Result<SchemaDetails, ApiError> {
        self.send(
            "update_schema",
            self.make_request(Method::PATCH, &format!("connections/{connector_id}/schemas"))
                .json(request),
        )
        .await
    }

    async fn reload_schema(
        &self,
        connector_id: &str,
        exclude_mode: ExcludeMode,
    ) -> Result<SchemaDetails, ApiError> {
        self.send(
            "reload_schema",
            self.make_request(
                Method::POST,
                &format!("connections/{connector_id}/schemas/reload"),
            )
            .json(&ReloadSchemaRequest { exclude_mode }),
        )
        .await
    }
}
