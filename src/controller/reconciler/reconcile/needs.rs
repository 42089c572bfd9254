//! What a pass has to touch, decided before any remote call is made.

use crate::controller::reconciler::fingerprint;
use crate::controller::reconciler::identity::RemoteIdentity;
use crate::controller::reconciler::metadata;
use crate::controller::reconciler::status::has_failed_conditions;
use crate::crd::FivetranConnector;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileNeeds {
    pub connector: bool,
    pub schema: bool,
}

impl ReconcileNeeds {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.connector && !self.schema
    }
}

/// Compare the resource with the state last applied to Fivetran
///
/// A force label or any failed condition reconciles everything. Otherwise the
/// connector is reconciled when its fingerprint moved or its id is not known,
/// and the schema when its fingerprint moved. A declared schema on a
/// connector without a known id always counts as changed.
///
/// # Errors
/// Returns the serialization error when a fingerprint cannot be computed
pub fn determine_needs(
    resource: &FivetranConnector,
    identity: &RemoteIdentity,
) -> Result<ReconcileNeeds, serde_json::Error> {
    let has_schema = resource.spec.has_schema_config();

    if metadata::is_force_reconcile(resource) || has_failed_conditions(resource) {
        return Ok(ReconcileNeeds {
            connector: true,
            schema: has_schema,
        });
    }

    let connector_digest = fingerprint::connector_fingerprint(&resource.spec.connector)?;
    let connector = !identity.is_known()
        || fingerprint::changed(
            &connector_digest,
            metadata::stored_connector_fingerprint(resource),
        );

    let schema = has_schema
        && (!identity.is_known() || {
            let schema_digest =
                fingerprint::schema_fingerprint(resource.spec.connector_schemas.as_ref())?;
            fingerprint::changed(&schema_digest, metadata::stored_schema_fingerprint(resource))
        });

    Ok(ReconcileNeeds { connector, schema })
}
