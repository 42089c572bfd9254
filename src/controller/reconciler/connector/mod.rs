//! # Connector Lifecycle
//!
//! Create, adopt or update the Fivetran connector behind a resource.
//!
//! | Identity     | Action                                  |
//! |--------------|-----------------------------------------|
//! | `Unknown`    | create (paused), record id              |
//! | `Recovering` | fetch, validate, record id, then update |
//! | `Known`      | full update                             |
//!
//! Updates always send every settable field, so repeating one leaves the
//! remote connector unchanged.

pub mod adoption;

use crate::constants::{
    CONDITION_CONNECTOR_READY, CONNECTOR_HASH_ANNOTATION, CONNECTOR_ID_ANNOTATION,
    MESSAGE_CONNECTOR_READY, REASON_RECONCILED_SUCCESSFULLY,
};
use crate::controller::reconciler::error::ReconcilerError;
use crate::controller::reconciler::fingerprint;
use crate::controller::reconciler::identity::RemoteIdentity;
use crate::controller::reconciler::metadata;
use crate::controller::reconciler::status::{self, STATUS_TRUE};
use crate::controller::reconciler::types::Reconciler;
use crate::crd::{ConnectorSpec, FivetranConnector};
use crate::fivetran::{ConnectorSettings, CreateConnectorRequest, UpdateConnectorRequest};
use crate::observability::metrics;
use crate::vault::{SecretResolver, SecretStore, VaultError};
use kube::ResourceExt;
use serde_json::Value;
use tracing::info;

/// `config` and `auth` with every Vault reference substituted
///
/// Lives only for the duration of one pass and is never logged.
#[derive(Clone, Default, PartialEq)]
pub struct ResolvedConnector {
    pub config: Option<Value>,
    pub auth: Option<Value>,
}

impl std::fmt::Debug for ResolvedConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConnector")
            .field("config", &self.config.as_ref().map(|_| "***"))
            .field("auth", &self.auth.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ResolvedConnector {
    /// Resolve both documents with one resolver so shared paths are read once
    ///
    /// # Errors
    /// Returns the first [`VaultError`]; nothing is returned partially resolved
    pub async fn resolve(store: &dyn SecretStore, spec: &ConnectorSpec) -> Result<Self, VaultError> {
        let mut resolver = SecretResolver::new(store);
        let config = match &spec.config {
            Some(document) => Some(resolver.resolve(document, "config").await?),
            None => None,
        };
        let auth = match &spec.auth {
            Some(document) => Some(resolver.resolve(document, "auth").await?),
            None => None,
        };
        Ok(Self { config, auth })
    }
}

/// Settings shared by create and update
///
/// `run_setup_tests` is always sent as `false`: setup tests run through their
/// own endpoint after the call so their results land on `SetupTestReady`.
/// The declared toggle decides whether that step runs.
#[must_use]
pub fn connector_settings(spec: &ConnectorSpec, resolved: &ResolvedConnector) -> ConnectorSettings {
    ConnectorSettings {
        paused: spec.paused,
        sync_frequency: spec.sync_frequency,
        daily_sync_time: spec.daily_sync_time.clone(),
        pause_after_trial: spec.pause_after_trial,
        run_setup_tests: false,
        trust_certificates: spec.trust_certificates,
        trust_fingerprints: spec.trust_fingerprints,
        data_delay_sensitivity: spec
            .data_delay_sensitivity
            .map(|s| s.as_str().to_string()),
        data_delay_threshold: spec.data_delay_threshold,
        networking_method: spec.networking_method.clone(),
        proxy_agent_id: spec.proxy_agent_id.clone(),
        private_link_id: spec.private_link_id.clone(),
        hybrid_deployment_agent_id: spec.hybrid_deployment_agent_id.clone(),
        config: resolved.config.clone(),
        auth: resolved.auth.clone(),
    }
}

/// Create payload; connectors are always created paused and without a
/// schedule type, which Fivetran only accepts on update
#[must_use]
pub fn create_request(spec: &ConnectorSpec, resolved: &ResolvedConnector) -> CreateConnectorRequest {
    let mut settings = connector_settings(spec, resolved);
    settings.paused = Some(true);
    CreateConnectorRequest {
        service: spec.service.clone(),
        group_id: spec.group_id.clone(),
        settings,
    }
}

#[must_use]
pub fn update_request(spec: &ConnectorSpec, resolved: &ResolvedConnector) -> UpdateConnectorRequest {
    UpdateConnectorRequest {
        settings: connector_settings(spec, resolved),
        schedule_type: spec.schedule_type.map(|t| t.as_str().to_string()),
    }
}

/// Bring the remote connector in line with the spec and return its id
///
/// Adoption failures are wrapped in [`ReconcilerError::Adoption`].
///
/// # Errors
/// Returns API, validation and store errors from the individual steps
pub async fn reconcile_connector(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    identity: &RemoteIdentity,
    resolved: &ResolvedConnector,
) -> Result<String, ReconcilerError> {
    let connector_id = match identity {
        RemoteIdentity::Unknown => create_connector(ctx, resource, resolved).await?,
        RemoteIdentity::Recovering {
            connector_id,
            source,
        } => {
            adoption::adopt_connector(ctx, resource, connector_id, *source, resolved)
                .await
                .map_err(|e| ReconcilerError::Adoption(Box::new(e)))?;
            update_connector(ctx, connector_id, &resource.spec.connector, resolved).await?;
            connector_id.clone()
        }
        RemoteIdentity::Known(connector_id) => {
            update_connector(ctx, connector_id, &resource.spec.connector, resolved).await?;
            connector_id.clone()
        }
    };

    record_applied(ctx, resource, &connector_id).await?;
    status::set_condition(
        ctx.store.as_ref(),
        resource,
        CONDITION_CONNECTOR_READY,
        STATUS_TRUE,
        REASON_RECONCILED_SUCCESSFULLY,
        MESSAGE_CONNECTOR_READY,
    )
    .await?;
    Ok(connector_id)
}

async fn create_connector(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    resolved: &ResolvedConnector,
) -> Result<String, ReconcilerError> {
    let request = create_request(&resource.spec.connector, resolved);
    let created = ctx
        .fivetran
        .create_connector(&request)
        .await
        .map_err(|e| ReconcilerError::api("create connector", e))?;
    metrics::increment_connector_operations("create");

    status::set_connector_id(ctx.store.as_ref(), resource, &created.id).await?;
    info!(
        resource.name = resource.name_any().as_str(),
        connector.id = created.id.as_str(),
        connector.service = request.service.as_str(),
        "connector.created"
    );
    Ok(created.id)
}

/// Full update of every settable field
///
/// # Errors
/// Returns [`ReconcilerError::Api`] when Fivetran rejects the update
pub async fn update_connector(
    ctx: &Reconciler,
    connector_id: &str,
    spec: &ConnectorSpec,
    resolved: &ResolvedConnector,
) -> Result<(), ReconcilerError> {
    ctx.fivetran
        .update_connector(connector_id, &update_request(spec, resolved))
        .await
        .map_err(|e| ReconcilerError::api("update connector", e))?;
    metrics::increment_connector_operations("update");
    info!(connector.id = connector_id, "Updated Fivetran connector");
    Ok(())
}

/// Persist the connector fingerprint and the backup copy of the id
async fn record_applied(
    ctx: &Reconciler,
    resource: &mut FivetranConnector,
    connector_id: &str,
) -> Result<(), ReconcilerError> {
    let digest = fingerprint::connector_fingerprint(&resource.spec.connector)
        .map_err(|e| ReconcilerError::Internal(e.into()))?;
    metadata::set_annotation(resource, CONNECTOR_HASH_ANNOTATION, digest);
    metadata::set_annotation(resource, CONNECTOR_ID_ANNOTATION, connector_id);
    status::save(ctx.store.as_ref(), resource).await?;
    Ok(())
}
