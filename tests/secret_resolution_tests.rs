//! # Secret Resolution Tests
//!
//! Vault references inside `config` and `auth`, resolved during a pass and
//! directly through the resolver.

mod common;

use common::{connector_only, Harness, StaticSecretStore};
use fivetran_operator::constants::{
    CONDITION_CONNECTOR_READY, REASON_VAULT_CLIENT_INIT_FAILED, REASON_VAULT_RESOLUTION_FAILED,
};
use fivetran_operator::prelude::*;
use fivetran_operator::vault::SecretResolver;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_resolver_substitutes_nested_references() {
    let store = StaticSecretStore::default();
    store.put(
        "secret/orders/db",
        &[("password", json!("s3cr3t")), ("port", json!(5432))],
    );
    store.put("secret/orders/ssh", &[("key", json!("-----BEGIN KEY-----"))]);

    let document = json!({
        "host": "orders.db.internal",
        "password": "vault:secret/orders/db#password",
        "port": "vault:secret/orders/db#port",
        "tunnels": [
            {"host": "bastion", "private_key": "vault:secret/orders/ssh#key"}
        ],
        "replicas": 2,
        "ssl": true
    });

    let mut resolver = SecretResolver::new(&store);
    let resolved = resolver.resolve(&document, "config").await.unwrap();

    assert_eq!(
        resolved,
        json!({
            "host": "orders.db.internal",
            "password": "s3cr3t",
            "port": 5432,
            "tunnels": [
                {"host": "bastion", "private_key": "-----BEGIN KEY-----"}
            ],
            "replicas": 2,
            "ssl": true
        })
    );
    assert_eq!(resolver.fetch_count(), 2);
}

#[tokio::test]
async fn test_resolver_caches_paths_across_documents() {
    let store = StaticSecretStore::default();
    store.put("secret/orders/db", &[("password", json!("s3cr3t"))]);

    let mut resolver = SecretResolver::new(&store);
    resolver
        .resolve(&json!({"password": "vault:secret/orders/db#password"}), "config")
        .await
        .unwrap();
    resolver
        .resolve(&json!({"token": "vault:secret/orders/db#password"}), "auth")
        .await
        .unwrap();

    assert_eq!(store.reads().len(), 1);
}

#[tokio::test]
async fn test_document_without_references_is_returned_unchanged() {
    let store = StaticSecretStore::default();
    let document = json!({"host": "db", "vault": "not-a-reference"});

    let mut resolver = SecretResolver::new(&store);
    let resolved = resolver.resolve(&document, "config").await.unwrap();

    assert_eq!(resolved, document);
    assert!(store.reads().is_empty());
}

#[tokio::test]
async fn test_malformed_reference_fails_before_any_read() {
    let store = StaticSecretStore::default();
    let document = json!({
        "password": "vault:secret/orders/db#password",
        "user": "vault:secret/orders/db"
    });

    let mut resolver = SecretResolver::new(&store);
    let err = resolver.resolve(&document, "config").await.unwrap_err();

    assert_eq!(err.key_path, "config.user");
    assert_eq!(err.kind, VaultErrorKind::InvalidReference);
    assert!(!err.is_retryable());
    assert!(store.reads().is_empty());
}

#[tokio::test]
async fn test_missing_key_lists_available_keys() {
    let store = StaticSecretStore::default();
    store.put(
        "secret/orders/db",
        &[("user", json!("fivetran")), ("host", json!("db"))],
    );

    let mut resolver = SecretResolver::new(&store);
    let err = resolver
        .resolve(
            &json!({"credentials": [{"password": "vault:secret/orders/db#password"}]}),
            "config",
        )
        .await
        .unwrap_err();

    assert_eq!(err.key_path, "config.credentials[0].password");
    assert_eq!(
        err.kind,
        VaultErrorKind::KeyNotFound {
            path: "secret/orders/db".to_string(),
            key: "password".to_string(),
            available: vec!["host".to_string(), "user".to_string()],
        }
    );
}

#[tokio::test]
async fn test_missing_secret_is_terminal() {
    let h = Harness::new();
    let mut spec = connector_only();
    spec.connector.config = Some(json!({
        "host": "orders.db.internal",
        "password": "vault:secret/orders/missing#password"
    }));
    h.create("orders", spec);

    let outcome = h.reconcile("orders").await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Done);
    assert_eq!(h.fivetran.total_calls(), 0);
    let ready = h.condition("orders", CONDITION_CONNECTOR_READY).unwrap();
    assert_eq!(ready.status, "False");
    assert_eq!(ready.reason.as_deref(), Some(REASON_VAULT_RESOLUTION_FAILED));
    assert_eq!(
        ready.message.as_deref(),
        Some(
            "config.password: vault reference 'vault:secret/orders/missing#password': \
             secret not found at path 'secret/orders/missing'"
        )
    );
}

#[tokio::test]
async fn test_secret_without_data_is_terminal() {
    let h = Harness::new();
    h.vault().put_empty("secret/orders/db");
    h.create("orders", connector_only());

    assert_eq!(
        h.reconcile("orders").await.unwrap(),
        ReconcileOutcome::Done
    );
    let ready = h.condition("orders", CONDITION_CONNECTOR_READY).unwrap();
    assert!(ready
        .message
        .unwrap()
        .contains("secret data is nil at path 'secret/orders/db'"));
}

#[tokio::test]
async fn test_vault_transport_failure_requeues() {
    let h = Harness::new();
    h.vault().fail(
        "secret/orders/db",
        SecretStoreError::Transport("connection refused".to_string()),
    );
    h.create("orders", connector_only());

    let outcome = h.reconcile("orders").await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::RequeueAfter(Duration::from_secs(300)));
    assert_eq!(h.fivetran.total_calls(), 0);
    let ready = h.condition("orders", CONDITION_CONNECTOR_READY).unwrap();
    assert_eq!(ready.reason.as_deref(), Some(REASON_VAULT_RESOLUTION_FAILED));
}

#[tokio::test]
async fn test_unavailable_vault_client_is_propagated() {
    let h = Harness::new();
    h.secrets
        .make_unavailable("secret 'fivetran-vault-secret' not found in namespace 'data'");
    h.create("orders", connector_only());

    let err = h.reconcile("orders").await.unwrap_err();

    assert!(matches!(err, ReconcilerError::SecretStoreUnavailable(_)));
    assert_eq!(err.disposition(), Disposition::Propagate);
    let ready = h.condition("orders", CONDITION_CONNECTOR_READY).unwrap();
    assert_eq!(ready.status, "False");
    assert_eq!(ready.reason.as_deref(), Some(REASON_VAULT_CLIENT_INIT_FAILED));
    assert!(ready.message.unwrap().contains("fivetran-vault-secret"));
}

#[tokio::test]
async fn test_auth_references_are_resolved() {
    let h = Harness::new();
    h.vault()
        .put("secret/orders/oauth", &[("refresh_token", json!("rt-123"))]);
    let mut spec = connector_only();
    spec.connector.auth = Some(json!({
        "client_access": {"client_id": "fivetran"},
        "refresh_token": "vault:secret/orders/oauth#refresh_token"
    }));
    h.create("orders", spec);

    h.reconcile("orders").await.unwrap();

    let state = h.fivetran.state();
    let auth = state.created[0].settings.auth.as_ref().unwrap();
    assert_eq!(auth["refresh_token"], json!("rt-123"));
    assert_eq!(auth["client_access"]["client_id"], json!("fivetran"));
}
