//! Database migrations for the connection synchronizer.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_12_05_000100_create_variables;
mod m2025_12_05_000200_create_connections;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_12_05_000100_create_variables::Migration),
            Box::new(m2025_12_05_000200_create_connections::Migration),
        ]
    }
}
