//! # Resource Markers
//!
//! Annotation, label and finalizer helpers for the markers the engine keeps
//! on each `FivetranConnector`.

use crate::constants::{
    ADOPT_CONNECTOR_ANNOTATION, CONNECTOR_HASH_ANNOTATION, CONNECTOR_ID_ANNOTATION, FINALIZER,
    FORCE_RECONCILE_LABEL, SCHEMA_HASH_ANNOTATION,
};
use crate::crd::FivetranConnector;
use kube::ResourceExt;

/// Annotation value, treating an empty value as absent
pub fn annotation<'a>(resource: &'a FivetranConnector, key: &str) -> Option<&'a str> {
    resource
        .annotations()
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

pub fn set_annotation(resource: &mut FivetranConnector, key: &str, value: impl Into<String>) {
    resource
        .annotations_mut()
        .insert(key.to_string(), value.into());
}

/// Returns whether the annotation was present
pub fn remove_annotation(resource: &mut FivetranConnector, key: &str) -> bool {
    resource.annotations_mut().remove(key).is_some()
}

pub fn has_label(resource: &FivetranConnector, key: &str) -> bool {
    resource.labels().contains_key(key)
}

/// Returns whether the label was present
pub fn remove_label(resource: &mut FivetranConnector, key: &str) -> bool {
    resource.labels_mut().remove(key).is_some()
}

pub fn has_finalizer(resource: &FivetranConnector) -> bool {
    resource.finalizers().iter().any(|f| f == FINALIZER)
}

/// Returns whether the finalizer had to be added
pub fn add_finalizer(resource: &mut FivetranConnector) -> bool {
    if has_finalizer(resource) {
        return false;
    }
    resource.finalizers_mut().push(FINALIZER.to_string());
    true
}

/// Returns whether the finalizer was present
pub fn remove_finalizer(resource: &mut FivetranConnector) -> bool {
    let finalizers = resource.finalizers_mut();
    let before = finalizers.len();
    finalizers.retain(|f| f != FINALIZER);
    finalizers.len() != before
}

pub fn is_force_reconcile(resource: &FivetranConnector) -> bool {
    has_label(resource, FORCE_RECONCILE_LABEL)
}

pub fn stored_connector_fingerprint(resource: &FivetranConnector) -> Option<&str> {
    annotation(resource, CONNECTOR_HASH_ANNOTATION)
}

pub fn stored_schema_fingerprint(resource: &FivetranConnector) -> Option<&str> {
    annotation(resource, SCHEMA_HASH_ANNOTATION)
}

pub fn backup_connector_id(resource: &FivetranConnector) -> Option<&str> {
    annotation(resource, CONNECTOR_ID_ANNOTATION)
}

pub fn adoption_request(resource: &FivetranConnector) -> Option<&str> {
    annotation(resource, ADOPT_CONNECTOR_ANNOTATION)
}

/// Drop the one-shot markers (force label, adoption request)
///
/// Returns whether anything was removed.
pub fn clear_transient_markers(resource: &mut FivetranConnector) -> bool {
    let label = remove_label(resource, FORCE_RECONCILE_LABEL);
    let adoption = remove_annotation(resource, ADOPT_CONNECTOR_ANNOTATION);
    label || adoption
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ConnectorSpec, FivetranConnectorSpec};

    fn resource() -> FivetranConnector {
        FivetranConnector::new(
            "orders",
            FivetranConnectorSpec {
                connector: ConnectorSpec {
                    group_id: "group".to_string(),
                    service: "postgres".to_string(),
                    ..Default::default()
                },
                connector_schemas: None,
            },
        )
    }

    #[test]
    fn test_finalizer_add_and_remove() {
        let mut r = resource();
        assert!(add_finalizer(&mut r));
        assert!(!add_finalizer(&mut r));
        assert!(has_finalizer(&r));
        assert!(remove_finalizer(&mut r));
        assert!(!has_finalizer(&r));
        assert!(!remove_finalizer(&mut r));
    }

    #[test]
    fn test_empty_annotation_is_absent() {
        let mut r = resource();
        set_annotation(&mut r, CONNECTOR_ID_ANNOTATION, "");
        assert_eq!(backup_connector_id(&r), None);
        set_annotation(&mut r, CONNECTOR_ID_ANNOTATION, "conn_1");
        assert_eq!(backup_connector_id(&r), Some("conn_1"));
    }

    #[test]
    fn test_clear_transient_markers() {
        let mut r = resource();
        assert!(!clear_transient_markers(&mut r));

        r.labels_mut()
            .insert(FORCE_RECONCILE_LABEL.to_string(), "true".to_string());
        set_annotation(&mut r, ADOPT_CONNECTOR_ANNOTATION, "conn_1");
        set_annotation(&mut r, CONNECTOR_ID_ANNOTATION, "conn_1");

        assert!(is_force_reconcile(&r));
        assert!(clear_transient_markers(&mut r));
        assert!(!is_force_reconcile(&r));
        assert_eq!(adoption_request(&r), None);
        assert_eq!(backup_connector_id(&r), Some("conn_1"));
    }
}
