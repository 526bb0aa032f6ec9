use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::{ApiError, ApiResult};
use crate::models::{DeleteParams, DeleteResponse};
use crate::AppState;

/// Delete a file by its storage name
pub async fn delete_file(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> ApiResult<Json<DeleteResponse>> {
    let name = params
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("name required".to_string()))?;

    tracing::info!("Received delete request for {}", name);
    state.file_service.delete(&name).await?;

    Ok(Json(DeleteResponse::deleted()))
}
