//! Connection Synchronizer
//!
//! Reads the named configuration variable, validates each organization entry,
//! decrypts its access token under the run key, and replaces the matching
//! registry connection. One straight-through pass: entries are independent,
//! the only shared state is the key and the registry.
//!
//! A disabled or malformed entry is skipped without side effects. A failed
//! decryption aborts the remainder of the run, mirroring the all-or-nothing
//! key resolution up front. A failed registry transaction is scoped to its
//! entry and later entries still run.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::{Map as JsonMap, Value as JsonValue, json};
use tracing::{debug, info, instrument, warn};

use crate::crypto::{CryptoKey, decrypt_token};
use crate::error::SyncError;
use crate::stores::{ConfigSource, ConnectionStore, NewConnection, Runnable, SecretSource};

/// Instance URL forced onto every HubSpot connection, regardless of the
/// value supplied in the entry.
pub const HUBSPOT_API_URL: &str = "https://api.hubapi.com/";

/// Connection scheme recorded for every synchronized entry.
const CONN_TYPE_HTTP: &str = "http";

/// Integration kinds the synchronizer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationKind {
    GoogleAnalytics,
    Hubspot,
    Salesforce,
}

impl IntegrationKind {
    /// Parses the `type` field of a config entry.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GOOGLE_ANALYTICS" => Some(Self::GoogleAnalytics),
            "HUBSPOT" => Some(Self::Hubspot),
            "SALESFORCE" => Some(Self::Salesforce),
            _ => None,
        }
    }

    /// Short prefix used to derive the connection identifier.
    pub fn conn_prefix(&self) -> &'static str {
        match self {
            Self::Salesforce => "sf",
            Self::Hubspot => "hs",
            Self::GoogleAnalytics => "ga",
        }
    }
}

/// Why an entry was passed over without producing a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    NotAnObject,
    Disabled,
    UnsupportedType,
    MalformedField(&'static str),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::NotAnObject => write!(f, "entry is not an object"),
            Skip::Disabled => write!(f, "entry is not enabled"),
            Skip::UnsupportedType => write!(f, "unsupported integration type"),
            Skip::MalformedField(field) => {
                write!(f, "field '{}' is missing or not a string", field)
            }
        }
    }
}

/// One validated entry of the configuration mapping.
#[derive(Debug, Clone)]
struct ConfigEntry {
    organization: String,
    kind: IntegrationKind,
    token: String,
    instance_url: String,
}

impl ConfigEntry {
    /// Lenient field extraction: a disabled entry or any missing/wrong-typed
    /// field yields a [`Skip`], never a run failure.
    fn parse(value: &JsonValue) -> Result<Self, Skip> {
        let fields = value.as_object().ok_or(Skip::NotAnObject)?;

        // A disabled entry may be a half-finished config; never push it.
        if fields.get("is_enabled").and_then(JsonValue::as_bool) != Some(true) {
            return Err(Skip::Disabled);
        }

        let kind = fields
            .get("type")
            .and_then(JsonValue::as_str)
            .and_then(IntegrationKind::parse)
            .ok_or(Skip::UnsupportedType)?;

        let organization = fields
            .get("organization")
            .and_then(JsonValue::as_str)
            .ok_or(Skip::MalformedField("organization"))?;

        let token = fields
            .get("token")
            .and_then(JsonValue::as_str)
            .ok_or(Skip::MalformedField("token"))?;

        let instance_url = fields
            .get("instance_url")
            .and_then(JsonValue::as_str)
            .ok_or(Skip::MalformedField("instance_url"))?;

        Ok(Self {
            organization: organization.to_string(),
            kind,
            token: token.to_string(),
            instance_url: instance_url.to_string(),
        })
    }

    fn conn_id(&self) -> String {
        format!("{}_{}", self.kind.conn_prefix(), self.organization)
    }
}

/// Recognized synchronizer options.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Name of the configuration variable holding the organization mapping.
    pub config_key: String,
    /// `conn_id` of the registry entry whose password holds the base64
    /// symmetric key. Required when `assume_encrypted` is set.
    pub key_source_id: Option<String>,
    /// Whether entry tokens are ciphertext. When unset, tokens are used
    /// verbatim and no key is resolved.
    pub assume_encrypted: bool,
}

/// Outcome counters for one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Synchronizes externally stored credential configuration into the
/// connection registry. Holds no state between runs.
pub struct ConnectionSynchronizer {
    secrets: Arc<dyn SecretSource>,
    config: Arc<dyn ConfigSource>,
    store: Arc<dyn ConnectionStore>,
    options: SyncOptions,
}

impl ConnectionSynchronizer {
    /// Creates a new synchronizer over the given collaborators
    pub fn new(
        secrets: Arc<dyn SecretSource>,
        config: Arc<dyn ConfigSource>,
        store: Arc<dyn ConnectionStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            secrets,
            config,
            store,
            options,
        }
    }

    /// Resolves the symmetric key from the configured secret entry.
    async fn resolve_key(&self) -> Result<CryptoKey, SyncError> {
        let source_id =
            self.options
                .key_source_id
                .as_deref()
                .ok_or_else(|| SyncError::KeyResolution {
                    source_id: String::new(),
                    reason: "no key source configured while tokens are encrypted".to_string(),
                })?;

        let secret = self
            .secrets
            .secret_value(source_id)
            .await
            .map_err(|e| SyncError::KeyResolution {
                source_id: source_id.to_string(),
                reason: e.to_string(),
            })?;

        let Some(secret) = secret.filter(|value| !value.is_empty()) else {
            return Err(SyncError::KeyResolution {
                source_id: source_id.to_string(),
                reason: "secret entry is missing or has no secret value".to_string(),
            });
        };

        CryptoKey::from_base64(&secret).map_err(|e| SyncError::KeyResolution {
            source_id: source_id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetches the configuration mapping; an absent record is an empty
    /// mapping, not an error.
    async fn fetch_entries(&self) -> Result<JsonMap<String, JsonValue>, SyncError> {
        let record = self
            .config
            .fetch(&self.options.config_key)
            .await
            .map_err(|source| SyncError::ConfigFetch {
                key: self.options.config_key.clone(),
                source,
            })?;

        match record {
            None => {
                info!(
                    config_key = %self.options.config_key,
                    "configuration record absent, nothing to synchronize"
                );
                Ok(JsonMap::new())
            }
            Some(JsonValue::Object(map)) => Ok(map),
            Some(_) => {
                warn!(
                    config_key = %self.options.config_key,
                    "configuration record is not an object, treating as empty"
                );
                Ok(JsonMap::new())
            }
        }
    }

    /// Runs one synchronization pass over the configuration mapping.
    #[instrument(skip(self), fields(config_key = %self.options.config_key))]
    pub async fn synchronize(&self) -> Result<SyncReport, SyncError> {
        let key = if self.options.assume_encrypted {
            Some(self.resolve_key().await?)
        } else {
            None
        };

        let entries = self.fetch_entries().await?;
        let mut report = SyncReport::default();

        for (name, value) in &entries {
            let entry = match ConfigEntry::parse(value) {
                Ok(entry) => entry,
                Err(reason) => {
                    debug!(entry = %name, %reason, "skipping config entry");
                    counter!("connection_sync_entries_skipped_total").increment(1);
                    report.skipped += 1;
                    continue;
                }
            };

            // A corrupt ciphertext or mismatched key aborts the run here.
            let access_token = match &key {
                Some(key) => decrypt_token(key, &entry.token)?,
                None => entry.token.clone(),
            };

            let host = match entry.kind {
                IntegrationKind::Hubspot => HUBSPOT_API_URL.to_string(),
                _ => entry.instance_url.clone(),
            };

            let conn_id = entry.conn_id();
            let record = NewConnection {
                conn_id: conn_id.clone(),
                conn_type: CONN_TYPE_HTTP.to_string(),
                host: Some(host),
                password: Some(access_token),
                extra: Some(json!({"auth_type": "direct"})),
            };

            match self.store.upsert(record).await {
                Ok(()) => {
                    info!(entry = %name, conn_id = %conn_id, "synchronized connection");
                    counter!("connection_sync_entries_synced_total").increment(1);
                    report.synced += 1;
                }
                Err(source) => {
                    let err = SyncError::Persistence {
                        conn_id: conn_id.clone(),
                        source,
                    };
                    warn!(entry = %name, error = %err, "connection not synchronized");
                    counter!("connection_sync_entries_failed_total").increment(1);
                    report.failed += 1;
                }
            }
        }

        info!(
            synced = report.synced,
            skipped = report.skipped,
            failed = report.failed,
            "synchronization pass complete"
        );

        Ok(report)
    }
}

#[async_trait]
impl Runnable for ConnectionSynchronizer {
    async fn run(&self) -> anyhow::Result<()> {
        self.synchronize().await?;
        Ok(())
    }
}
