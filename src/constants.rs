//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for errors the engine could not classify (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default requeue interval for retryable Vault and Fivetran failures (seconds)
pub const DEFAULT_RETRYABLE_ERROR_REQUEUE_SECS: u64 = 300;

/// Default delay before restarting the watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default Fivetran REST API base URL
pub const DEFAULT_FIVETRAN_API_URL: &str = "https://api.fivetran.com";

/// Default per-request timeout for Fivetran and Vault HTTP calls (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default name of the Secret holding the Vault AppRole settings
pub const DEFAULT_VAULT_SECRET_NAME: &str = "fivetran-vault-secret";

/// Re-authenticate against Vault when the token has less TTL left than this (seconds)
pub const DEFAULT_VAULT_MIN_TOKEN_TTL_SECS: u64 = 300;

/// Field manager used for status and metadata writes
pub const FIELD_MANAGER: &str = "fivetran-operator";

/// Finalizer guarding remote connector deletion
pub const FINALIZER: &str = "fivetran.dataverse.redhat.com/finalizer";

/// Label that forces a full reconciliation when present
pub const FORCE_RECONCILE_LABEL: &str = "operator.dataverse.redhat.com/force-reconcile";

/// Annotation holding the fingerprint of the last applied connector configuration
pub const CONNECTOR_HASH_ANNOTATION: &str = "operator.dataverse.redhat.com/connector-hash";

/// Annotation holding the fingerprint of the last applied schema configuration
pub const SCHEMA_HASH_ANNOTATION: &str = "operator.dataverse.redhat.com/schema-hash";

/// Annotation mirroring the connector id recorded in status
pub const CONNECTOR_ID_ANNOTATION: &str = "operator.dataverse.redhat.com/connector-id";

/// Annotation requesting adoption of an existing connector
pub const ADOPT_CONNECTOR_ANNOTATION: &str =
    "operator.dataverse.redhat.com/adopt-existing-connector-id";

/// Dashboard URL prefix for connectors
pub const CONNECTOR_DASHBOARD_URL: &str = "https://fivetran.com/dashboard/connectors";

/// Provider error code returned when a connector has no schema configuration yet
pub const SCHEMA_NOT_FOUND_CODE: &str = "NotFound_SchemaConfig";

/// Prefix marking a string value as a Vault reference
pub const VAULT_REFERENCE_PREFIX: &str = "vault:";

/// Sync frequency (minutes) that allows a daily sync time
pub const DAILY_SYNC_FREQUENCY: u32 = 1440;

/// Sync frequencies (minutes) accepted by Fivetran
pub const ALLOWED_SYNC_FREQUENCIES: [u32; 11] = [1, 5, 15, 30, 60, 120, 180, 360, 480, 720, 1440];

/// Condition types
pub const CONDITION_CONNECTOR_READY: &str = "ConnectorReady";
pub const CONDITION_SETUP_TEST_READY: &str = "SetupTestReady";
pub const CONDITION_SCHEMA_READY: &str = "SchemaReady";

/// Condition reasons
pub const REASON_RECONCILED_SUCCESSFULLY: &str = "ReconciledSuccessfully";
pub const REASON_RECONCILED_WITH_WARNINGS: &str = "ReconciledSuccessfullyWithWarnings";
pub const REASON_RECONCILIATION_FAILED: &str = "ReconciliationFailed";
pub const REASON_SKIPPED: &str = "Skipped";
pub const REASON_DELETION_FAILED: &str = "DeletionFailed";
pub const REASON_FINALIZER_UPDATE_FAILED: &str = "FinalizerUpdateFailed";
pub const REASON_SPEC_VALIDATION_FAILED: &str = "SpecValidationFailed";
pub const REASON_VAULT_CLIENT_INIT_FAILED: &str = "VaultClientInitializationFailed";
pub const REASON_VAULT_RESOLUTION_FAILED: &str = "VaultSecretsResolutionFailed";
pub const REASON_ADOPTION_FAILED: &str = "ExistingConnectorAdoptionFailed";

/// Condition messages
pub const MESSAGE_CONNECTOR_READY: &str = "Connector is ready";
pub const MESSAGE_SETUP_TESTS_PASSED: &str = "Setup tests completed successfully";
pub const MESSAGE_SETUP_TESTS_SKIPPED: &str = "Setup tests skipped";
pub const MESSAGE_SCHEMA_READY: &str = "Schema configuration is ready";
pub const MESSAGE_NO_SCHEMA: &str = "No schema configuration specified";
