use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata row describing one stored file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: String,
    /// Object storage key: `id` followed by the lowercased extension
    pub name: String,
    pub original_name: String,
    pub size: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Values inserted for a new upload; `uploaded_at` is assigned by the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    pub id: String,
    pub name: String,
    pub original_name: String,
    pub size: i64,
    pub content_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: String,
    pub name: String,
    pub original_name: String,
}

impl From<FileRecord> for UploadResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            original_name: record.original_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
}

impl DeleteResponse {
    pub fn deleted() -> Self {
        Self {
            status: "deleted".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub name: Option<String>,
}
