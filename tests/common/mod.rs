//! Shared test fixtures
//!
//! In-memory stand-ins for the three collaborators of the reconciler (the
//! resource store, the Fivetran API and the Vault secret store), plus the
//! rustls initialization the Pact tests need.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use fivetran_operator::controller::reconciler::connector::adoption::expected_schema_name;
use fivetran_operator::fivetran::types::{SchemaState, TableState};
use fivetran_operator::fivetran::{
    ConnectorDetails, CreateConnectorRequest, ExcludeMode, SchemaConfigRequest, SchemaDetails,
    SetupTestResult, SetupTestsRequest, UpdateConnectorRequest,
};
use fivetran_operator::prelude::*;
use fivetran_operator::vault::SecretRead;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, Once};

pub const NAMESPACE: &str = "data";

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it is installed a single time across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().expect("test mutex poisoned")
}

// ---------------------------------------------------------------------------
// Resource store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    objects: BTreeMap<(String, String), FivetranConnector>,
    version: u64,
    conflict_next_write: bool,
    updates: usize,
    status_updates: usize,
}

impl StoreState {
    fn next_version(&mut self) -> String {
        self.version += 1;
        self.version.to_string()
    }
}

/// Versioned in-memory [`ResourceStore`] with API-server write semantics
///
/// `update` ignores status and bumps the generation only when the spec
/// changed; `update_status` touches nothing but status. Removing the last
/// finalizer of a deleted object removes the object.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    state: Mutex<StoreState>,
}

fn key_of(resource: &FivetranConnector) -> (String, String) {
    (
        resource.metadata.namespace.clone().unwrap_or_default(),
        resource.metadata.name.clone().unwrap_or_default(),
    )
}

fn same_spec(a: &FivetranConnector, b: &FivetranConnector) -> bool {
    serde_json::to_value(&a.spec).ok() == serde_json::to_value(&b.spec).ok()
}

impl InMemoryResourceStore {
    /// Store a new object as the API server would on create
    pub fn insert(&self, mut resource: FivetranConnector) -> FivetranConnector {
        let mut state = lock(&self.state);
        resource.metadata.resource_version = Some(state.next_version());
        resource.metadata.generation = Some(1);
        resource.metadata.uid = Some(format!("uid-{}", state.version));
        state.objects.insert(key_of(&resource), resource.clone());
        resource
    }

    pub fn stored(&self, name: &str) -> Option<FivetranConnector> {
        lock(&self.state)
            .objects
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
    }

    /// User edit of the spec
    pub fn edit_spec(&self, name: &str, edit: impl FnOnce(&mut FivetranConnectorSpec)) {
        let mut state = lock(&self.state);
        let version = state.next_version();
        let object = state
            .objects
            .get_mut(&(NAMESPACE.to_string(), name.to_string()))
            .expect("object exists");
        edit(&mut object.spec);
        object.metadata.generation = Some(object.metadata.generation.unwrap_or(0) + 1);
        object.metadata.resource_version = Some(version);
    }

    /// User edit of labels or annotations
    pub fn edit_metadata(&self, name: &str, edit: impl FnOnce(&mut ObjectMeta)) {
        let mut state = lock(&self.state);
        let version = state.next_version();
        let object = state
            .objects
            .get_mut(&(NAMESPACE.to_string(), name.to_string()))
            .expect("object exists");
        edit(&mut object.metadata);
        object.metadata.resource_version = Some(version);
    }

    /// Simulate `kubectl delete`: with finalizers the object only gets a timestamp
    pub fn request_deletion(&self, name: &str) {
        let mut state = lock(&self.state);
        let version = state.next_version();
        let key = (NAMESPACE.to_string(), name.to_string());
        let object = state.objects.get_mut(&key).expect("object exists");
        if object.metadata.finalizers.as_ref().is_none_or(Vec::is_empty) {
            state.objects.remove(&key);
            return;
        }
        object.metadata.deletion_timestamp = Some(
            serde_json::from_value(json!("2025-01-01T00:00:00Z")).expect("valid timestamp"),
        );
        object.metadata.resource_version = Some(version);
    }

    /// Fail the next write with a version conflict
    pub fn conflict_next_write(&self) {
        lock(&self.state).conflict_next_write = true;
    }

    pub fn update_count(&self) -> usize {
        lock(&self.state).updates
    }

    pub fn status_update_count(&self) -> usize {
        lock(&self.state).status_updates
    }

    fn check_write(
        state: &mut StoreState,
        resource: &FivetranConnector,
    ) -> Result<FivetranConnector, StoreError> {
        if std::mem::take(&mut state.conflict_next_write) {
            return Err(StoreError::Conflict("injected conflict".to_string()));
        }
        let key = key_of(resource);
        let stored = state
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", key.0, key.1)))?;
        if stored.metadata.resource_version != resource.metadata.resource_version {
            return Err(StoreError::Conflict(format!(
                "the object has been modified; stored version {:?}, write based on {:?}",
                stored.metadata.resource_version, resource.metadata.resource_version
            )));
        }
        Ok(stored)
    }
}

#[async_trait]
impl ResourceStore for InMemoryResourceStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<FivetranConnector>, StoreError> {
        Ok(lock(&self.state)
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn update(&self, resource: &FivetranConnector) -> Result<FivetranConnector, StoreError> {
        let mut state = lock(&self.state);
        let stored = Self::check_write(&mut state, resource)?;
        state.updates += 1;

        let mut next = resource.clone();
        next.status = stored.status.clone();
        next.metadata.deletion_timestamp = stored.metadata.deletion_timestamp.clone();
        next.metadata.generation = if same_spec(&stored, resource) {
            stored.metadata.generation
        } else {
            Some(stored.metadata.generation.unwrap_or(0) + 1)
        };
        next.metadata.resource_version = Some(state.next_version());

        let key = key_of(&next);
        let released = next.metadata.deletion_timestamp.is_some()
            && next.metadata.finalizers.as_ref().is_none_or(Vec::is_empty);
        if released {
            state.objects.remove(&key);
        } else {
            state.objects.insert(key, next.clone());
        }
        Ok(next)
    }

    async fn update_status(
        &self,
        resource: &FivetranConnector,
    ) -> Result<FivetranConnector, StoreError> {
        let mut state = lock(&self.state);
        let mut next = Self::check_write(&mut state, resource)?;
        state.status_updates += 1;
        next.status = resource.status.clone();
        next.metadata.resource_version = Some(state.next_version());
        state.objects.insert(key_of(&next), next.clone());
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Fivetran
// ---------------------------------------------------------------------------

/// Scriptable state behind [`FakeFivetran`]
#[derive(Debug, Default)]
pub struct FakeState {
    pub connectors: BTreeMap<String, ConnectorDetails>,
    next_id: usize,
    pub setup_results: Vec<SetupTestResult>,
    /// What the source exposes; a reload discovers it
    pub source_schema: SchemaDetails,
    /// Live schema configuration per connector, absent until first built
    pub live_schemas: BTreeMap<String, SchemaDetails>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    pub calls: Vec<&'static str>,
    pub created: Vec<CreateConnectorRequest>,
    pub updates: Vec<(String, UpdateConnectorRequest)>,
    pub setup_requests: Vec<SetupTestsRequest>,
    pub schema_updates: Vec<SchemaConfigRequest>,
    pub reloads: Vec<ExcludeMode>,
    pub deleted: Vec<String>,
}

/// In-memory [`FivetranApi`]
///
/// Schema updates only take effect for schemas and tables already present in
/// the live configuration, the way Fivetran ignores settings for objects it
/// has not discovered. A reload copies newly discovered objects from
/// `source_schema`.
#[derive(Debug, Default)]
pub struct FakeFivetran {
    state: Mutex<FakeState>,
}

fn not_found(code: &str, what: &str) -> ApiError {
    ApiError::new(404, code, format!("{what} not found"))
}

impl FakeFivetran {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }

    /// Register a connector that exists before the test starts
    pub fn add_connector(&self, details: ConnectorDetails) {
        self.state().connectors.insert(details.id.clone(), details);
    }

    pub fn connector(&self, id: &str) -> Option<ConnectorDetails> {
        self.state().connectors.get(id).cloned()
    }

    /// Queue an error for the next call of `operation`
    pub fn fail_next(&self, operation: &'static str, error: ApiError) {
        self.state()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn set_source_schema(&self, schema: SchemaDetails) {
        self.state().source_schema = schema;
    }

    pub fn set_live_schema(&self, connector_id: &str, schema: SchemaDetails) {
        self.state()
            .live_schemas
            .insert(connector_id.to_string(), schema);
    }

    pub fn set_setup_results(&self, results: Vec<SetupTestResult>) {
        self.state().setup_results = results;
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    fn begin(&self, operation: &'static str) -> Result<MutexGuard<'_, FakeState>, ApiError> {
        let mut state = self.state();
        state.calls.push(operation);
        if let Some(error) = state
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        Ok(state)
    }
}

fn apply_schema_update(live: &mut SchemaDetails, request: &SchemaConfigRequest) {
    if let Some(policy) = &request.schema_change_handling {
        live.schema_change_handling.clone_from(policy);
    }
    for (schema_name, update) in &request.schemas {
        let Some(schema) = live.schemas.get_mut(schema_name) else {
            continue;
        };
        schema.enabled = Some(update.enabled);
        for (table_name, table_update) in &update.tables {
            let Some(table) = schema.tables.get_mut(table_name) else {
                continue;
            };
            table.enabled = Some(table_update.enabled);
            if let Some(mode) = &table_update.sync_mode {
                table.sync_mode = Some(mode.clone());
            }
        }
    }
}

fn merge_discovered(live: &mut SchemaDetails, source: &SchemaDetails, exclude_mode: ExcludeMode) {
    let discovered_enabled = |enabled: Option<bool>| match exclude_mode {
        ExcludeMode::Exclude => Some(false),
        ExcludeMode::Preserve => enabled,
    };
    for (schema_name, source_schema) in &source.schemas {
        let schema = live
            .schemas
            .entry(schema_name.clone())
            .or_insert_with(|| SchemaState {
                name_in_destination: source_schema.name_in_destination.clone(),
                enabled: discovered_enabled(source_schema.enabled),
                tables: BTreeMap::new(),
            });
        for (table_name, source_table) in &source_schema.tables {
            schema
                .tables
                .entry(table_name.clone())
                .or_insert_with(|| TableState {
                    enabled: discovered_enabled(source_table.enabled),
                    ..source_table.clone()
                });
        }
    }
}

#[async_trait]
impl FivetranApi for FakeFivetran {
    async fn create_connector(
        &self,
        request: &CreateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError> {
        let mut state = self.begin("create_connector")?;
        state.next_id += 1;
        let id = format!("conn_{}", state.next_id);
        let details = ConnectorDetails {
            id: id.clone(),
            group_id: request.group_id.clone(),
            service: request.service.clone(),
            schema: expected_schema_name(request.settings.config.as_ref()).unwrap_or_default(),
            paused: request.settings.paused,
            schedule_type: Some("auto".to_string()),
            sync_frequency: request.settings.sync_frequency,
            daily_sync_time: request.settings.daily_sync_time.clone(),
            setup_tests: Vec::new(),
        };
        state.created.push(request.clone());
        state.connectors.insert(id, details.clone());
        Ok(details)
    }

    async fn get_connector(&self, connector_id: &str) -> Result<ConnectorDetails, ApiError> {
        let state = self.begin("get_connector")?;
        state
            .connectors
            .get(connector_id)
            .cloned()
            .ok_or_else(|| not_found("NotFound_Connection", "connection"))
    }

    async fn update_connector(
        &self,
        connector_id: &str,
        request: &UpdateConnectorRequest,
    ) -> Result<ConnectorDetails, ApiError> {
        let mut state = self.begin("update_connector")?;
        state
            .updates
            .push((connector_id.to_string(), request.clone()));
        let details = state
            .connectors
            .get_mut(connector_id)
            .ok_or_else(|| not_found("NotFound_Connection", "connection"))?;
        let settings = &request.settings;
        if settings.paused.is_some() {
            details.paused = settings.paused;
        }
        if settings.sync_frequency.is_some() {
            details.sync_frequency = settings.sync_frequency;
        }
        if settings.daily_sync_time.is_some() {
            details.daily_sync_time.clone_from(&settings.daily_sync_time);
        }
        if request.schedule_type.is_some() {
            details.schedule_type.clone_from(&request.schedule_type);
        }
        Ok(details.clone())
    }

    async fn delete_connector(&self, connector_id: &str) -> Result<(), ApiError> {
        let mut state = self.begin("delete_connector")?;
        state
            .connectors
            .remove(connector_id)
            .ok_or_else(|| not_found("NotFound_Connection", "connection"))?;
        state.live_schemas.remove(connector_id);
        state.deleted.push(connector_id.to_string());
        Ok(())
    }

    async fn run_setup_tests(
        &self,
        connector_id: &str,
        request: &SetupTestsRequest,
    ) -> Result<Vec<SetupTestResult>, ApiError> {
        let mut state = self.begin("run_setup_tests")?;
        if !state.connectors.contains_key(connector_id) {
            return Err(not_found("NotFound_Connection", "connection"));
        }
        state.setup_requests.push(*request);
        Ok(state.setup_results.clone())
    }

    async fn get_schema_details(&self, connector_id: &str) -> Result<SchemaDetails, ApiError> {
        let state = self.begin("get_schema_details")?;
        state
            .live_schemas
            .get(connector_id)
            .cloned()
            .ok_or_else(|| not_found("NotFound_SchemaConfig", "schema config"))
    }

    async fn update_schema(
        &self,
        connector_id: &str,
        request: &SchemaConfigRequest,
    ) -> Result<SchemaDetails, ApiError> {
        let mut state = self.begin("update_schema")?;
        state.schema_updates.push(request.clone());
        let live = state
            .live_schemas
            .get_mut(connector_id)
            .ok_or_else(|| not_found("NotFound_SchemaConfig", "schema config"))?;
        apply_schema_update(live, request);
        Ok(live.clone())
    }

    async fn reload_schema(
        &self,
        connector_id: &str,
        exclude_mode: ExcludeMode,
    ) -> Result<SchemaDetails, ApiError> {
        let mut state = self.begin("reload_schema")?;
        if !state.connectors.contains_key(connector_id) {
            return Err(not_found("NotFound_Connection", "connection"));
        }
        state.reloads.push(exclude_mode);
        let source = state.source_schema.clone();
        let live = state
            .live_schemas
            .entry(connector_id.to_string())
            .or_insert_with(|| SchemaDetails {
                schema_change_handling: source.schema_change_handling.clone(),
                schemas: BTreeMap::new(),
            });
        merge_discovered(live, &source, exclude_mode);
        Ok(live.clone())
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// In-memory [`SecretStore`] that records every read
#[derive(Debug, Default)]
pub struct StaticSecretStore {
    entries: Mutex<HashMap<String, Result<SecretRead, SecretStoreError>>>,
    reads: Mutex<Vec<String>>,
}

impl StaticSecretStore {
    pub fn put(&self, path: &str, pairs: &[(&str, Value)]) {
        let data = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        lock(&self.entries).insert(path.to_string(), Ok(SecretRead::Found(data)));
    }

    pub fn put_empty(&self, path: &str) {
        lock(&self.entries).insert(path.to_string(), Ok(SecretRead::NoData));
    }

    pub fn fail(&self, path: &str, error: SecretStoreError) {
        lock(&self.entries).insert(path.to_string(), Err(error));
    }

    pub fn reads(&self) -> Vec<String> {
        lock(&self.reads).clone()
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn read_secret(&self, path: &str) -> Result<SecretRead, SecretStoreError> {
        lock(&self.reads).push(path.to_string());
        lock(&self.entries)
            .get(path)
            .cloned()
            .unwrap_or(Ok(SecretRead::NotFound))
    }
}

/// Hands out the same [`StaticSecretStore`] for every namespace
#[derive(Debug, Default)]
pub struct StaticSecretProvider {
    pub store: Arc<StaticSecretStore>,
    unavailable: Mutex<Option<String>>,
    requests: Mutex<Vec<String>>,
}

impl StaticSecretProvider {
    /// Make every `store_for` fail, as when the Vault Secret is missing
    pub fn make_unavailable(&self, message: &str) {
        *lock(&self.unavailable) = Some(message.to_string());
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl SecretStoreProvider for StaticSecretProvider {
    async fn store_for(&self, namespace: &str) -> anyhow::Result<Arc<dyn SecretStore>> {
        lock(&self.requests).push(namespace.to_string());
        if let Some(message) = lock(&self.unavailable).clone() {
            anyhow::bail!("{message}");
        }
        Ok(Arc::clone(&self.store) as Arc<dyn SecretStore>)
    }
}

// ---------------------------------------------------------------------------
// Harness and fixtures
// ---------------------------------------------------------------------------

/// Reconciler wired to the in-memory collaborators
pub struct Harness {
    pub store: Arc<InMemoryResourceStore>,
    pub fivetran: Arc<FakeFivetran>,
    pub secrets: Arc<StaticSecretProvider>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryResourceStore::default());
        let fivetran = Arc::new(FakeFivetran::default());
        let secrets = Arc::new(StaticSecretProvider::default());
        secrets.store.put(
            "secret/orders/db",
            &[("password", json!("s3cr3t")), ("user", json!("fivetran"))],
        );

        let reconciler = Reconciler::new(
            Arc::clone(&store) as Arc<dyn ResourceStore>,
            Arc::clone(&fivetran) as Arc<dyn FivetranApi>,
            Arc::clone(&secrets) as Arc<dyn SecretStoreProvider>,
            ControllerConfig::default(),
        );
        Self {
            store,
            fivetran,
            secrets,
            reconciler,
        }
    }

    pub fn vault(&self) -> &StaticSecretStore {
        &self.secrets.store
    }

    pub fn create(&self, name: &str, spec: FivetranConnectorSpec) -> FivetranConnector {
        let mut resource = FivetranConnector::new(name, spec);
        resource.metadata.namespace = Some(NAMESPACE.to_string());
        self.store.insert(resource)
    }

    pub async fn reconcile(&self, name: &str) -> Result<ReconcileOutcome, ReconcilerError> {
        reconcile(&self.reconciler, NAMESPACE, name).await
    }

    /// Current stored copy; panics when the object is gone
    pub fn resource(&self, name: &str) -> FivetranConnector {
        self.store.stored(name).expect("resource exists")
    }

    pub fn condition(&self, name: &str, condition_type: &str) -> Option<Condition> {
        self.resource(name)
            .status
            .and_then(|s| s.conditions.into_iter().find(|c| c.r#type == condition_type))
    }

    pub fn connector_id(&self, name: &str) -> Option<String> {
        self.resource(name).status.and_then(|s| s.connector_id)
    }

    pub fn annotation(&self, name: &str, key: &str) -> Option<String> {
        self.resource(name)
            .metadata
            .annotations
            .and_then(|a| a.get(key).cloned())
    }
}

/// Postgres connector whose password comes from Vault
pub fn postgres_connector() -> ConnectorSpec {
    ConnectorSpec {
        group_id: "warehouse".to_string(),
        service: "postgres".to_string(),
        sync_frequency: Some(60),
        schedule_type: Some(ScheduleType::Auto),
        paused: Some(false),
        config: Some(json!({
            "host": "orders.db.internal",
            "port": 5432,
            "user": "vault:secret/orders/db#user",
            "password": "vault:secret/orders/db#password",
            "schema_prefix": "orders"
        })),
        ..Default::default()
    }
}

pub fn connector_only() -> FivetranConnectorSpec {
    FivetranConnectorSpec {
        connector: postgres_connector(),
        connector_schemas: None,
    }
}

/// `public.orders` enabled with soft deletes, new columns allowed
pub fn declared_schema(tables: &[&str]) -> SchemaSpec {
    SchemaSpec {
        schema_change_handling: Some(SchemaChangeHandling::AllowColumns),
        schemas: BTreeMap::from([(
            "public".to_string(),
            SchemaNode {
                enabled: true,
                tables: tables
                    .iter()
                    .map(|table| {
                        (
                            (*table).to_string(),
                            TableNode {
                                enabled: true,
                                sync_mode: Some(SyncMode::SoftDelete),
                                columns: BTreeMap::new(),
                            },
                        )
                    })
                    .collect(),
            },
        )]),
    }
}

pub fn with_schema(tables: &[&str]) -> FivetranConnectorSpec {
    FivetranConnectorSpec {
        connector: postgres_connector(),
        connector_schemas: Some(declared_schema(tables)),
    }
}

/// Source exposing `public` with the given tables, all disabled
pub fn source_schema(tables: &[&str]) -> SchemaDetails {
    SchemaDetails {
        schema_change_handling: "ALLOW_ALL".to_string(),
        schemas: BTreeMap::from([(
            "public".to_string(),
            SchemaState {
                name_in_destination: Some("public".to_string()),
                enabled: Some(false),
                tables: tables
                    .iter()
                    .map(|table| {
                        (
                            (*table).to_string(),
                            TableState {
                                name_in_destination: Some((*table).to_string()),
                                enabled: Some(false),
                                sync_mode: Some("HISTORY".to_string()),
                                columns: BTreeMap::new(),
                            },
                        )
                    })
                    .collect(),
            },
        )]),
    }
}

pub fn setup_result(title: &str, status: &str, message: &str) -> SetupTestResult {
    SetupTestResult {
        title: title.to_string(),
        status: status.to_string(),
        message: message.to_string(),
        details: None,
    }
}

/// Existing connector as Fivetran would report it for [`postgres_connector`]
pub fn existing_postgres(id: &str) -> ConnectorDetails {
    ConnectorDetails {
        id: id.to_string(),
        group_id: "warehouse".to_string(),
        service: "postgres".to_string(),
        schema: "orders".to_string(),
        paused: Some(false),
        schedule_type: Some("auto".to_string()),
        sync_frequency: Some(60),
        daily_sync_time: None,
        setup_tests: Vec::new(),
    }
}
