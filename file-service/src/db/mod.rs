pub mod connection;
pub mod repository;

pub use repository::PgFileRepository;

use async_trait::async_trait;

use crate::models::{FileRecord, NewFileRecord};

// Error types for database setup
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Access to the `files` metadata table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a record and return it with its server-assigned timestamp
    async fn insert_file(&self, file: &NewFileRecord) -> Result<FileRecord, sqlx::Error>;

    /// All records, most recently uploaded first
    async fn list_files(&self) -> Result<Vec<FileRecord>, sqlx::Error>;

    /// Delete records by storage name, returning the number of rows removed
    async fn delete_by_name(&self, name: &str) -> Result<u64, sqlx::Error>;
}
