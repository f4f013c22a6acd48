//! Integration tests for the connection synchronizer against a real
//! (in-memory SQLite) metadata database, using the SeaORM repositories for
//! every collaborator seam.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use connection_sync::crypto::{CryptoKey, encrypt_token};
use connection_sync::error::SyncError;
use connection_sync::repositories::{ConnectionRepository, VariableRepository};
use connection_sync::stores::NewConnection;
use connection_sync::sync::{ConnectionSynchronizer, HUBSPOT_API_URL, SyncOptions, SyncReport};
use sea_orm::DatabaseConnection;
use serde_json::{Value as JsonValue, json};

#[path = "test_utils/mod.rs"]
mod test_utils;

const KEY_SOURCE_ID: &str = "connection_sync_key";
const CONFIG_KEY: &str = "org_connections";

fn test_key_bytes() -> Vec<u8> {
    vec![42u8; 32]
}

fn test_key() -> CryptoKey {
    CryptoKey::new(test_key_bytes()).expect("valid test key")
}

struct Harness {
    connections: Arc<ConnectionRepository>,
    variables: Arc<VariableRepository>,
}

impl Harness {
    async fn new() -> Self {
        let db: Arc<DatabaseConnection> = test_utils::setup_test_db_arc()
            .await
            .expect("test database with migrations");

        Self {
            connections: Arc::new(ConnectionRepository::new(db.clone())),
            variables: Arc::new(VariableRepository::new(db)),
        }
    }

    /// Stores the symmetric key in the password field of the key-source
    /// registry entry, the way operators provision it.
    async fn seed_key_entry(&self) {
        self.connections
            .replace(NewConnection {
                conn_id: KEY_SOURCE_ID.to_string(),
                conn_type: "generic".to_string(),
                host: None,
                password: Some(BASE64.encode(test_key_bytes())),
                extra: None,
            })
            .await
            .expect("seeding key entry");
    }

    async fn seed_config(&self, value: JsonValue) {
        self.variables
            .set_json(CONFIG_KEY, value)
            .await
            .expect("seeding configuration variable");
    }

    fn synchronizer(&self) -> ConnectionSynchronizer {
        self.synchronizer_with(SyncOptions {
            config_key: CONFIG_KEY.to_string(),
            key_source_id: Some(KEY_SOURCE_ID.to_string()),
            assume_encrypted: true,
        })
    }

    fn synchronizer_with(&self, options: SyncOptions) -> ConnectionSynchronizer {
        ConnectionSynchronizer::new(
            self.connections.clone(),
            self.variables.clone(),
            self.connections.clone(),
            options,
        )
    }
}

fn salesforce_entry(token_ciphertext: &str) -> JsonValue {
    json!({
        "is_enabled": true,
        "organization": "acme",
        "type": "SALESFORCE",
        "token": token_ciphertext,
        "instance_url": "https://acme.my.salesforce.com"
    })
}

#[tokio::test]
async fn salesforce_entry_creates_expected_record() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let token = encrypt_token(&test_key(), "tok123").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&token)}))
        .await;

    let report = harness.synchronizer().synchronize().await.expect("pass succeeds");
    assert_eq!(report, SyncReport { synced: 1, skipped: 0, failed: 0 });

    let record = harness
        .connections
        .find_by_conn_id("sf_acme")
        .await
        .expect("registry readable")
        .expect("record exists");

    assert_eq!(record.conn_type, "http");
    assert_eq!(record.host.as_deref(), Some("https://acme.my.salesforce.com"));
    assert_eq!(record.password.as_deref(), Some("tok123"));
    assert_eq!(record.extra, Some(json!({"auth_type": "direct"})));
}

#[tokio::test]
async fn hubspot_host_is_fixed_endpoint() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let token = encrypt_token(&test_key(), "hub-token").unwrap();
    harness
        .seed_config(json!({
            "acme": {
                "is_enabled": true,
                "organization": "acme",
                "type": "HUBSPOT",
                "token": token,
                "instance_url": "https://ignored.example"
            }
        }))
        .await;

    harness.synchronizer().synchronize().await.expect("pass succeeds");

    let record = harness
        .connections
        .find_by_conn_id("hs_acme")
        .await
        .expect("registry readable")
        .expect("record exists");

    assert_eq!(record.host.as_deref(), Some(HUBSPOT_API_URL));
    assert_eq!(record.password.as_deref(), Some("hub-token"));
}

#[tokio::test]
async fn rerun_keeps_exactly_one_record_per_entry() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let token = encrypt_token(&test_key(), "tok123").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&token)}))
        .await;

    harness.synchronizer().synchronize().await.expect("first pass");
    harness.synchronizer().synchronize().await.expect("second pass");

    let count = harness
        .connections
        .count_by_conn_id("sf_acme")
        .await
        .expect("registry readable");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn rerun_picks_up_rotated_token() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let first = encrypt_token(&test_key(), "tok-old").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&first)}))
        .await;
    harness.synchronizer().synchronize().await.expect("first pass");

    let second = encrypt_token(&test_key(), "tok-new").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&second)}))
        .await;
    harness.synchronizer().synchronize().await.expect("second pass");

    let record = harness
        .connections
        .find_by_conn_id("sf_acme")
        .await
        .expect("registry readable")
        .expect("record exists");
    assert_eq!(record.password.as_deref(), Some("tok-new"));
}

#[tokio::test]
async fn disabled_and_malformed_entries_are_skipped() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let token = encrypt_token(&test_key(), "tok123").unwrap();
    harness
        .seed_config(json!({
            "disabled": {
                "is_enabled": false,
                "organization": "disabled",
                "type": "SALESFORCE",
                "token": token,
                "instance_url": "https://disabled.example"
            },
            "wrong_type": {
                "is_enabled": true,
                "organization": "wrong",
                "type": "SLACK",
                "token": token,
                "instance_url": "https://wrong.example"
            },
            "numeric_token": {
                "is_enabled": true,
                "organization": "numeric",
                "type": "SALESFORCE",
                "token": 12345,
                "instance_url": "https://numeric.example"
            }
        }))
        .await;

    let report = harness.synchronizer().synchronize().await.expect("pass succeeds");
    assert_eq!(report, SyncReport { synced: 0, skipped: 3, failed: 0 });

    for conn_id in ["sf_disabled", "sf_wrong", "sf_numeric"] {
        let count = harness
            .connections
            .count_by_conn_id(conn_id)
            .await
            .expect("registry readable");
        assert_eq!(count, 0, "no record expected for {}", conn_id);
    }
}

#[tokio::test]
async fn absent_config_record_is_a_noop() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let report = harness.synchronizer().synchronize().await.expect("pass succeeds");
    assert_eq!(report, SyncReport::default());
}

#[tokio::test]
async fn missing_key_entry_fails_before_any_entry() {
    let harness = Harness::new().await;

    let token = encrypt_token(&test_key(), "tok123").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&token)}))
        .await;

    let err = harness
        .synchronizer()
        .synchronize()
        .await
        .expect_err("run aborts");
    assert!(matches!(err, SyncError::KeyResolution { .. }));

    let count = harness
        .connections
        .count_by_conn_id("sf_acme")
        .await
        .expect("registry readable");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn wrong_key_aborts_run() {
    let harness = Harness::new().await;
    harness.seed_key_entry().await;

    let other_key = CryptoKey::new(vec![9u8; 32]).unwrap();
    let token = encrypt_token(&other_key, "tok123").unwrap();
    harness
        .seed_config(json!({"acme": salesforce_entry(&token)}))
        .await;

    let err = harness
        .synchronizer()
        .synchronize()
        .await
        .expect_err("run aborts");
    assert!(matches!(err, SyncError::Decryption(_)));
}

#[tokio::test]
async fn plaintext_tokens_pass_through() {
    let harness = Harness::new().await;

    harness
        .seed_config(json!({"acme": salesforce_entry("tok-plain")}))
        .await;

    let report = harness
        .synchronizer_with(SyncOptions {
            config_key: CONFIG_KEY.to_string(),
            key_source_id: None,
            assume_encrypted: false,
        })
        .synchronize()
        .await
        .expect("pass succeeds");
    assert_eq!(report.synced, 1);

    let record = harness
        .connections
        .find_by_conn_id("sf_acme")
        .await
        .expect("registry readable")
        .expect("record exists");
    assert_eq!(record.password.as_deref(), Some("tok-plain"));
}

#[tokio::test]
async fn replace_is_delete_before_insert() {
    let harness = Harness::new().await;

    for host in ["https://first.example", "https://second.example"] {
        harness
            .connections
            .replace(NewConnection {
                conn_id: "sf_acme".to_string(),
                conn_type: "http".to_string(),
                host: Some(host.to_string()),
                password: Some("tok".to_string()),
                extra: None,
            })
            .await
            .expect("replace succeeds");
    }

    let count = harness
        .connections
        .count_by_conn_id("sf_acme")
        .await
        .expect("registry readable");
    assert_eq!(count, 1);

    let record = harness
        .connections
        .find_by_conn_id("sf_acme")
        .await
        .expect("registry readable")
        .expect("record exists");
    assert_eq!(record.host.as_deref(), Some("https://second.example"));
}

#[tokio::test]
async fn variable_repository_roundtrips_json() {
    let harness = Harness::new().await;

    assert!(
        harness
            .variables
            .get_json("missing")
            .await
            .expect("store readable")
            .is_none()
    );

    harness
        .variables
        .set_json("some_key", json!({"a": 1}))
        .await
        .expect("insert succeeds");
    harness
        .variables
        .set_json("some_key", json!({"a": 2}))
        .await
        .expect("overwrite succeeds");

    let value = harness
        .variables
        .get_json("some_key")
        .await
        .expect("store readable")
        .expect("value exists");
    assert_eq!(value, json!({"a": 2}));
}
