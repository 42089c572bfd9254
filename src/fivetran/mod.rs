//! # Fivetran
//!
//! Connector provider API consumed by the reconciler.
//!
//! - `client.rs` - reqwest implementation of [`FivetranApi`]
//! - `types.rs` - request and response payloads
//! - `errors.rs` - [`ApiError`] and its retry classification
//! - `comparison.rs` - structural schema comparison
//! - `schema_builder.rs` - schema update payload builder

pub mod client;
pub mod comparison;
pub mod errors;
pub mod schema_builder;
pub mod types;

use async_trait::async_trait;

pub use client::FivetranClient;
pub use comparison::{compare_schema, SchemaMismatch};
pub use errors::ApiError;
pub use schema_builder::{build_schema_request, SchemaBuildError, SchemaConfigBuilder};
pub use types::{
    ConnectorDetails, ConnectorSettings, CreateConnectorRequest, ExcludeMode,
    SchemaConfigRequest, SchemaDetails, SetupTestResult, SetupTestsRequest,
    UpdateConnectorRequest,
};

/// Fivetran connector operations
///
/// Implementations must be safe to share between concurrent reconciliations.
#[async_trait]
pub trait FivetranApi: Send + Sync {
    async fn create_connector(
        &self,
        request: &CreateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError>;

    async fn get_connector(&self, connector_id: &str) -> Result<ConnectorDetails, ApiError>;

    async fn update_connector(
        &self,
        connector_id: &str,
        request: &UpdateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError>;

    async fn delete_connector(&self, connector_id: &str) -> Result<(), ApiError>;

    /// Run the connector's setup tests and return the individual results
    async fn run_setup_tests(
        &self,
        connector_id: &str,
        request: &SetupTestsRequest,
    ) -> Result<Vec<SetupTestResult>, ApiError>;

    async fn get_schema_details(&self, connector_id: &str) -> Result<SchemaDetails, ApiError>;

    async fn update_schema(
        &self,
        connector_id: &str,
        request: &SchemaConfigRequest,
    ) -> Result<SchemaDetails, ApiError>;

    /// Re-discover the source's schemas
    async fn reload_schema(
        &self,
        connector_id: &str,
        exclude_mode: ExcludeMode,
    ) -> Result<SchemaDetails, ApiError>;
}
