//! # Connection Synchronizer Entry Point
//!
//! Executes one synchronization pass against the orchestrator metadata
//! database and exits.

use std::sync::Arc;

use connection_sync::config::ConfigLoader;
use connection_sync::repositories::{ConnectionRepository, VariableRepository};
use connection_sync::stores::Runnable;
use connection_sync::sync::{ConnectionSynchronizer, SyncOptions};
use connection_sync::{db, logging};
use migration::{Migrator, MigratorTrait};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    logging::init_subscriber(&config);

    if let Ok(redacted_json) = config.redacted_json() {
        info!(profile = %config.profile, "loaded configuration: {}", redacted_json);
    }

    let db = Arc::new(db::init_pool(&config).await?);
    db::health_check(db.as_ref()).await?;
    Migrator::up(db.as_ref(), None).await?;

    let connections = Arc::new(ConnectionRepository::new(db.clone()));
    let variables = Arc::new(VariableRepository::new(db));

    let synchronizer = ConnectionSynchronizer::new(
        connections.clone(),
        variables,
        connections,
        SyncOptions {
            config_key: config.config_key.clone(),
            key_source_id: config.key_source_id.clone(),
            assume_encrypted: config.assume_encrypted,
        },
    );

    synchronizer.run().await?;

    Ok(())
}
