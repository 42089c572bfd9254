//! # Remote Identity
//!
//! Where the Fivetran connector id of a resource comes from.
//!
//! The id in status is authoritative. Without it, an adoption request or the
//! backup marker names a connector that must be validated before it is
//! trusted; with neither, the connector has to be created.

use crate::controller::reconciler::metadata;
use crate::crd::FivetranConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    /// `connector-id` annotation left by an earlier create
    BackupMarker,
    /// `adopt-existing-connector-id` annotation set by a user
    AdoptionRequest,
}

impl RecoverySource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoverySource::BackupMarker => "backup-marker",
            RecoverySource::AdoptionRequest => "adoption-request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteIdentity {
    Unknown,
    Recovering {
        connector_id: String,
        source: RecoverySource,
    },
    Known(String),
}

impl RemoteIdentity {
    /// Status first, then an explicit adoption request, then the backup marker
    #[must_use]
    pub fn of(resource: &FivetranConnector) -> Self {
        if let Some(id) = resource
            .status
            .as_ref()
            .and_then(|s| s.connector_id.as_deref())
            .filter(|id| !id.is_empty())
        {
            return RemoteIdentity::Known(id.to_string());
        }

        if let Some(id) = metadata::adoption_request(resource) {
            return RemoteIdentity::Recovering {
                connector_id: id.to_string(),
                source: RecoverySource::AdoptionRequest,
            };
        }

        match metadata::backup_connector_id(resource) {
            Some(id) => RemoteIdentity::Recovering {
                connector_id: id.to_string(),
                source: RecoverySource::BackupMarker,
            },
            None => RemoteIdentity::Unknown,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, RemoteIdentity::Known(_))
    }

    #[must_use]
    pub fn connector_id(&self) -> Option<&str> {
        match self {
            RemoteIdentity::Unknown => None,
            RemoteIdentity::Recovering { connector_id, .. } => Some(connector_id),
            RemoteIdentity::Known(id) => Some(id),
        }
    }
}
