use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod observability;
mod services;
mod storage;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::db::PgFileRepository;
use crate::services::FileService;
use crate::storage::{ObjectStore, S3Client};

pub const SERVICE_NAME: &str = "file-service";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub file_service: Arc<FileService>,
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/upload", post(handlers::upload::upload_file))
        .route("/download", get(handlers::download::download_file))
        .route("/files", get(handlers::files::list_files))
        .route("/delete", get(handlers::delete::delete_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Graceful shutdown handler
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    observability::init_logging(&config.logging, SERVICE_NAME)?;
    config.validate().context("Invalid configuration")?;

    info!("Starting File Service v{}", env!("CARGO_PKG_VERSION"));

    // Metadata store: database, then table
    let pool = db::connection::create_connection_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::connection::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // Object store: bucket is created on first start
    let s3_client = S3Client::new(&config.storage).await;
    s3_client
        .ensure_bucket()
        .await
        .context("Failed to prepare storage bucket")?;
    info!("Object storage ready, bucket: {}", s3_client.bucket());

    let file_service = FileService::new(
        Arc::new(s3_client),
        Arc::new(PgFileRepository::new(pool.clone())),
    );
    let state = AppState {
        file_service: Arc::new(file_service),
    };

    let app = create_router(state, config.server.max_upload_bytes());

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("File Service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db::connection::close_connections(&pool).await;
    info!("File Service shut down gracefully");
    Ok(())
}
