use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::FileRepository;
use crate::models::{FileRecord, NewFileRecord};
use crate::storage::{ObjectStore, StorageError, StoredObject};

/// Extensions tried, in order, when resolving a download id to a storage key
pub const CANDIDATE_EXTENSIONS: [&str; 8] =
    ["", ".jpg", ".png", ".pdf", ".txt", ".zip", ".docx", ".mp4"];

#[derive(Debug, Error)]
pub enum FileServiceError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("DB error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A file received from a client
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Coordinates the object store and the metadata table.
///
/// Neither upload nor delete is atomic across the two backends. Upload removes
/// the object again when the metadata insert fails; delete removes the object
/// first and reports a record it could not delete afterwards.
pub struct FileService {
    store: Arc<dyn ObjectStore>,
    repository: Arc<dyn FileRepository>,
}

impl FileService {
    pub fn new(store: Arc<dyn ObjectStore>, repository: Arc<dyn FileRepository>) -> Self {
        Self { store, repository }
    }

    /// Store the content, then record its metadata
    pub async fn upload(&self, upload: FileUpload) -> Result<FileRecord, FileServiceError> {
        let id = Uuid::new_v4().to_string();
        let name = format!("{}{}", id, file_extension(&upload.original_name));

        info!(
            "Uploading file: original_name={}, name={}, size={} bytes, content_type={:?}",
            upload.original_name,
            name,
            upload.data.len(),
            upload.content_type
        );

        let new_file = NewFileRecord {
            id,
            name,
            original_name: upload.original_name,
            size: upload.data.len() as i64,
            content_type: upload.content_type,
        };

        self.store
            .put_object(&new_file.name, upload.data, &new_file.content_type)
            .await?;

        match self.repository.insert_file(&new_file).await {
            Ok(record) => Ok(record),
            Err(e) => {
                error!("Failed to create file record for {}: {}", new_file.name, e);

                // Rollback: the object has no metadata pointing at it
                if let Err(remove_err) = self.store.remove_object(&new_file.name).await {
                    error!(
                        "Failed to rollback upload of {}, object is orphaned: {}",
                        new_file.name, remove_err
                    );
                }

                Err(FileServiceError::Database(e))
            }
        }
    }

    /// Resolve `id` to the first existing `id + extension` object and open it
    pub async fn download(&self, id: &str) -> Result<StoredObject, FileServiceError> {
        for extension in CANDIDATE_EXTENSIONS {
            let key = format!("{}{}", id, extension);

            match self.store.stat_object(&key).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!("No object under {}", key);
                    continue;
                }
                Err(e) => {
                    warn!("Stat failed for {}, trying next candidate: {}", key, e);
                    continue;
                }
            }

            match self.store.get_object(&key).await {
                Ok(object) => {
                    info!("Serving download: id={}, name={}", id, key);
                    return Ok(object);
                }
                Err(e) => warn!("Failed to open {}, trying next candidate: {}", key, e),
            }
        }

        debug!("No stored object matches id {}", id);
        Err(FileServiceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<FileRecord>, FileServiceError> {
        Ok(self.repository.list_files().await?)
    }

    /// Remove the object, then its metadata record
    pub async fn delete(&self, name: &str) -> Result<(), FileServiceError> {
        self.store.remove_object(name).await?;

        match self.repository.delete_by_name(name).await {
            Ok(0) => {
                debug!("No file record matched name {}", name);
                Err(FileServiceError::NotFound)
            }
            Ok(_) => {
                info!("File deleted: {}", name);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Object {} was removed but its file record could not be deleted: {}",
                    name, e
                );
                Err(FileServiceError::Database(e))
            }
        }
    }
}

/// Lowercased extension of the final path component, including the dot.
///
/// Returns an empty string when the name has no `.`.
pub fn file_extension(filename: &str) -> String {
    let base = base_name(filename);
    base.rfind('.')
        .map(|dot| base[dot..].to_lowercase())
        .unwrap_or_default()
}

/// Final path component of a client-supplied filename.
///
/// Trailing separators are ignored, so `dir/sub/` yields `sub`.
pub fn base_name(filename: &str) -> &str {
    let trimmed = filename.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
