use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::models::UploadResponse;
use crate::services::{base_name, FileUpload};
use crate::AppState;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// Handle file upload
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    tracing::info!("Received file upload request");

    let mut upload: Option<FileUpload> = None;

    // Extract file from multipart form
    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("unknown").to_string();
        tracing::debug!("Processing field: {}", field_name);

        if field_name != FILE_FIELD {
            continue;
        }

        // A part without a filename is a plain form value, not a file
        let original_name = match field.file_name().map(base_name) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                tracing::debug!("Ignoring {} field without a filename", field_name);
                continue;
            }
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;

        upload = Some(FileUpload {
            original_name,
            content_type,
            data,
        });
        break;
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("file not found".to_string()))?;
    let record = state.file_service.upload(upload).await?;

    Ok(Json(UploadResponse::from(record)))
}
