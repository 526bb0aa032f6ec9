//! Object storage layer
//!
//! File contents live in a single bucket keyed by storage name. Handlers reach
//! the bucket through the [`ObjectStore`] trait; [`S3Client`] is the
//! S3/MinIO implementation used in production.

pub mod s3_client;

pub use s3_client::S3Client;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

/// Storage error types
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Upload error: {0}")]
    UploadError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    #[error("Delete error: {0}")]
    DeleteError(String),

    #[error("Bucket error: {0}")]
    BucketError(String),
}

/// Byte stream of an object's content
pub type ObjectBody = BoxStream<'static, std::io::Result<Bytes>>;

/// Object metadata as reported by a stat call
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: Option<i64>,
    pub content_type: Option<String>,
}

/// An object opened for reading
pub struct StoredObject {
    pub info: ObjectInfo,
    pub body: ObjectBody,
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist yet
    async fn ensure_bucket(&self) -> Result<(), StorageError>;

    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// `Ok(None)` when no object exists under `key`
    async fn stat_object(&self, key: &str) -> Result<Option<ObjectInfo>, StorageError>;

    async fn get_object(&self, key: &str) -> Result<StoredObject, StorageError>;

    async fn remove_object(&self, key: &str) -> Result<(), StorageError>;
}
