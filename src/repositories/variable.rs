//! Variable repository for the orchestrator's key-value configuration store.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value as JsonValue;

use crate::models::variable::{self, Entity as Variable};
use crate::stores::ConfigSource;

/// Repository for variable reads and writes
#[derive(Debug, Clone)]
pub struct VariableRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl VariableRepository {
    /// Creates a new VariableRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the JSON payload stored under `key`, if present
    pub async fn get_json(&self, key: &str) -> Result<Option<JsonValue>> {
        Ok(Variable::find_by_id(key.to_string())
            .one(&*self.db)
            .await?
            .map(|model| model.value))
    }

    /// Creates or overwrites a variable. Used for seeding and tests.
    pub async fn set_json(&self, key: &str, value: JsonValue) -> Result<()> {
        let now = Utc::now();

        match Variable::find_by_id(key.to_string()).one(&*self.db).await? {
            Some(existing) => {
                let mut active: variable::ActiveModel = existing.into();
                active.value = Set(value);
                active.updated_at = Set(now.into());
                active
                    .update(&*self.db)
                    .await
                    .with_context(|| format!("updating variable '{}'", key))?;
            }
            None => {
                let active = variable::ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(value),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                };
                active
                    .insert(&*self.db)
                    .await
                    .with_context(|| format!("inserting variable '{}'", key))?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigSource for VariableRepository {
    async fn fetch(&self, key: &str) -> Result<Option<JsonValue>> {
        self.get_json(key).await
    }
}
