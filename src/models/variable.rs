//! Variable entity model
//!
//! Key-value configuration rows owned by the orchestrator. The synchronizer
//! reads its organization mapping from one of these.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "variables")]
pub struct Model {
    /// Variable name (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,

    /// JSON payload of the variable
    #[sea_orm(column_type = "JsonBinary")]
    pub value: JsonValue,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
