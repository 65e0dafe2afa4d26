//! Database setup and store selection

use anyhow::{Context, Result};
use intake_core::Config;
use intake_db::{FileRecordRepository, FileRecordStore, InMemoryFileRecordStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
pub async fn setup_store(config: &Config) -> Result<Arc<dyn FileRecordStore>> {
    match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = setup_database(config, database_url).await?;
            Ok(Arc::new(FileRecordRepository::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; records are lost on restart");
            Ok(Arc::new(InMemoryFileRecordStore::new()))
        }
    }
}

/// Setup database connection pool and run migrations
pub async fn setup_database(config: &Config, database_url: &str) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Database connected successfully"
    );

    // Run pending migrations on startup (path: workspace migrations/ from crate root)
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
