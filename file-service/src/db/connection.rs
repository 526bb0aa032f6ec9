use std::time::Duration;

use sqlx::{
    migrate::MigrateDatabase,
    postgres::{PgPool, PgPoolOptions},
    Postgres,
};
use tracing::{debug, error, info};

use super::{DatabaseError, DatabaseResult};
use crate::config::DatabaseConfig;

/// Create the connection pool, creating the database first if it is missing
pub async fn create_connection_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!("Creating database connection pool...");

    ensure_database_exists(&config.url).await?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(config.idle_timeout_seconds)))
        .connect(&config.url)
        .await
        .map_err(|e| {
            error!("Failed to create connection pool: {}", e);
            DatabaseError::Connection(e)
        })?;

    info!(
        "Database connection pool created with {} max connections",
        config.max_connections
    );
    Ok(pool)
}

/// Ensure the database named in the URL exists, create it if it doesn't
async fn ensure_database_exists(database_url: &str) -> DatabaseResult<()> {
    let database_name = database_name(database_url)?;
    debug!("Checking if database '{}' exists...", database_name);

    if Postgres::database_exists(database_url).await? {
        debug!("Database '{}' already exists", database_name);
        return Ok(());
    }

    info!("Database '{}' does not exist, creating...", database_name);
    Postgres::create_database(database_url).await.map_err(|e| {
        error!("Failed to create database '{}': {}", database_name, e);
        DatabaseError::Migration(format!("Failed to create database: {}", e))
    })?;

    info!("Database '{}' created successfully", database_name);
    Ok(())
}

/// Extract the database name from a `postgresql://.../<name>?params` URL
fn database_name(database_url: &str) -> DatabaseResult<&str> {
    let without_scheme = database_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(|| DatabaseError::Config("Invalid database URL format".to_string()))?;

    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(path))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DatabaseError::Config("Database URL has no database name".to_string()))
}

/// Run the embedded migrations (creates the `files` table)
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        error!("Migration failed: {}", e);
        DatabaseError::Migration(e.to_string())
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}

/// Close database connections gracefully
pub async fn close_connections(pool: &PgPool) {
    info!("Closing database connections...");
    pool.close().await;
    info!("Database connections closed");
}
