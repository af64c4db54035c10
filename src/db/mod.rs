//! Database layer
//!
//! Provides:
//! - SeaORM entity models for the paired tables
//! - Repository pattern for data access
//! - Connection pool management and schema bootstrap

pub mod models;
mod repository;

pub use repository::{AiImageInput, ApodInput, InsertOutcome, Pair, Repository};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};

/// Open the process-wide connection pool.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    info!("Connecting to database...");

    let mut opts = ConnectOptions::new(&config.url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::DatabaseConnection(format!("failed to connect: {e}")))?;

    info!("Database connection established");
    Ok(db)
}

/// Create the two pair tables when they do not exist yet.
///
/// Built from the entities so it works against Postgres and the SQLite
/// test harness alike.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut apod_table = schema.create_table_from_entity(models::ApodEntity);
    apod_table.if_not_exists();
    db.execute(backend.build(&apod_table)).await?;

    let mut ai_table = schema.create_table_from_entity(models::AiApodEntity);
    ai_table.if_not_exists();
    db.execute(backend.build(&ai_table)).await?;

    Ok(())
}

/// Close the pool on shutdown; every handler has released its connection
/// by the time graceful shutdown gets here.
pub async fn shutdown(db: DatabaseConnection) {
    if let Err(err) = db.close().await {
        tracing::warn!(error = %err, "error while closing database pool");
    }
}
