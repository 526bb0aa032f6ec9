use axum::{extract::State, Json};

use crate::error::ApiResult;
use crate::models::FileRecord;
use crate::AppState;

/// List every file record, newest first
pub async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<FileRecord>>> {
    let files = state.file_service.list().await?;
    tracing::debug!("Listing {} file(s)", files.len());

    Ok(Json(files))
}
