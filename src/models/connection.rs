//! Connection entity model
//!
//! This module contains the SeaORM entity model for the connections table,
//! the orchestrator's registry of descriptors for reaching external services.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Connection entity representing one registry descriptor
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "connections")]
pub struct Model {
    /// Surrogate identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Derived identifier, e.g. `sf_acme`. At most one live row per value;
    /// uniqueness is maintained by delete-before-insert, not a constraint.
    pub conn_id: String,

    /// Connection scheme; the synchronizer always writes `http`
    pub conn_type: String,

    /// Instance URL of the external service
    pub host: Option<String>,

    /// Credential material: the decrypted access token, or for a key-source
    /// entry the base64-encoded symmetric key
    pub password: Option<String>,

    /// Opaque metadata blob consumed by downstream hooks
    #[sea_orm(column_type = "JsonBinary")]
    pub extra: Option<JsonValue>,

    /// Timestamp when the connection was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the connection was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
