//! # Resource Store
//!
//! Versioned access to `FivetranConnector` objects.
//!
//! Every write carries the object's `resourceVersion`; a write based on a
//! stale copy fails with [`StoreError::Conflict`] instead of overwriting.

use crate::crd::FivetranConnector;
use async_trait::async_trait;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource version conflict: {0}")]
    Conflict(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("kubernetes api error: {0}")]
    Kube(#[source] kube::Error),
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref response) if response.code == 409 => {
                StoreError::Conflict(response.message.clone())
            }
            kube::Error::Api(ref response) if response.code == 404 => {
                StoreError::NotFound(response.message.clone())
            }
            other => StoreError::Kube(other),
        }
    }
}

/// Get, update and update-status for connector resources
///
/// `update` writes metadata and spec, `update_status` writes only the status
/// subresource. Both return the object as stored, with its new version.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str)
        -> Result<Option<FivetranConnector>, StoreError>;

    async fn update(&self, resource: &FivetranConnector) -> Result<FivetranConnector, StoreError>;

    async fn update_status(
        &self,
        resource: &FivetranConnector,
    ) -> Result<FivetranConnector, StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
}

impl std::fmt::Debug for KubeResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceStore").finish_non_exhaustive()
    }
}

impl KubeResourceStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &FivetranConnector) -> Api<FivetranConnector> {
        let namespace = resource.namespace().unwrap_or_else(|| "default".to_string());
        Api::namespaced(self.client.clone(), &namespace)
    }
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<FivetranConnector>, StoreError> {
        let api: Api<FivetranConnector> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn update(&self, resource: &FivetranConnector) -> Result<FivetranConnector, StoreError> {
        let name = resource.name_any();
        Ok(self
            .api(resource)
            .replace(&name, &PostParams::default(), resource)
            .await?)
    }

    async fn update_status(
        &self,
        resource: &FivetranConnector,
    ) -> Result<FivetranConnector, StoreError> {
        let name = resource.name_any();
        // resourceVersion in a merge patch turns it into a conditional write
        let patch = serde_json::json!({
            "metadata": { "resourceVersion": resource.resource_version() },
            "status": resource.status,
        });
        Ok(self
            .api(resource)
            .patch_status(
                &name,
                &PatchParams::apply(crate::constants::FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("status {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn test_conflict_is_classified() {
        assert!(matches!(
            StoreError::from(api_error(409)),
            StoreError::Conflict(_)
        ));
        assert!(matches!(
            StoreError::from(api_error(404)),
            StoreError::NotFound(_)
        ));
        assert!(matches!(StoreError::from(api_error(500)), StoreError::Kube(_)));
    }
}
