//! Collaborator seams between the synchronizer and the host platform.
//!
//! The synchronizer never talks to storage directly; it is handed one
//! implementation of each of these traits. The SeaORM-backed repositories
//! implement them for the metadata database, and tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// A connection record ready to be written to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConnection {
    pub conn_id: String,
    pub conn_type: String,
    pub host: Option<String>,
    pub password: Option<String>,
    pub extra: Option<JsonValue>,
}

/// Source of secret material held by named entries.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Returns the secret value of the named entry, if the entry exists and
    /// carries one.
    async fn secret_value(&self, id: &str) -> anyhow::Result<Option<String>>;
}

/// Source of externally stored configuration records.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Returns the raw configuration record stored under `key`.
    async fn fetch(&self, key: &str) -> anyhow::Result<Option<JsonValue>>;
}

/// Write access to the connection registry.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Replaces any record with the same `conn_id` inside one transaction.
    async fn upsert(&self, record: NewConnection) -> anyhow::Result<()>;
}

/// Single-method seam the host platform invokes to execute the plugin.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}
