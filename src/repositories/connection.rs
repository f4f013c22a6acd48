//! Connection repository for registry operations
//!
//! This module provides the ConnectionRepository struct which encapsulates
//! SeaORM operations for the connections table. Replacement of a record is
//! a delete-then-insert pair inside one scoped transaction, so at most one
//! row per `conn_id` survives and a failed write rolls back cleanly.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::models::connection::{self, Entity as Connection};
use crate::stores::{ConnectionStore, NewConnection, SecretSource};

/// Repository for connection registry operations
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ConnectionRepository {
    /// Creates a new ConnectionRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a connection by its derived identifier
    pub async fn find_by_conn_id(&self, conn_id: &str) -> Result<Option<connection::Model>> {
        Ok(Connection::find()
            .filter(connection::Column::ConnId.eq(conn_id))
            .one(&*self.db)
            .await?)
    }

    /// Counts rows carrying the given identifier
    pub async fn count_by_conn_id(&self, conn_id: &str) -> Result<u64> {
        Ok(Connection::find()
            .filter(connection::Column::ConnId.eq(conn_id))
            .count(&*self.db)
            .await?)
    }

    /// Deletes any rows matching the record's `conn_id` and inserts the new
    /// row, inside a single transaction. Rollback on drop covers every error
    /// path before the commit.
    pub async fn replace(&self, record: NewConnection) -> Result<connection::Model> {
        let txn = self
            .db
            .begin()
            .await
            .context("starting registry transaction")?;

        Connection::delete_many()
            .filter(connection::Column::ConnId.eq(record.conn_id.as_str()))
            .exec(&txn)
            .await
            .with_context(|| format!("deleting existing rows for '{}'", record.conn_id))?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let active = connection::ActiveModel {
            id: Set(id),
            conn_id: Set(record.conn_id.clone()),
            conn_type: Set(record.conn_type),
            host: Set(record.host),
            password: Set(record.password),
            extra: Set(record.extra),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        active
            .insert(&txn)
            .await
            .with_context(|| format!("inserting connection '{}'", record.conn_id))?;

        txn.commit()
            .await
            .context("committing registry transaction")?;

        // For SQLite, query the record directly since we already know the ID
        let fetched = Connection::find_by_id(id).one(&*self.db).await?;
        fetched.ok_or_else(|| anyhow!("connection not persisted"))
    }
}

#[async_trait]
impl ConnectionStore for ConnectionRepository {
    async fn upsert(&self, record: NewConnection) -> Result<()> {
        self.replace(record).await.map(|_| ())
    }
}

#[async_trait]
impl SecretSource for ConnectionRepository {
    /// Secret entries live in the registry itself: the secret value is the
    /// `password` field of the row named by `id`.
    async fn secret_value(&self, id: &str) -> Result<Option<String>> {
        Ok(self.find_by_conn_id(id).await?.and_then(|model| model.password))
    }
}
