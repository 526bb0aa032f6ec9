use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ApiResult};
use crate::models::DownloadParams;
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Stream a stored file back as an attachment
pub async fn download_file(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> ApiResult<Response> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("id required".to_string()))?;

    let object = state.file_service.download(&id).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", object.info.key))
        .map_err(|_| ApiError::BadRequest("id contains invalid characters".to_string()))?;
    let content_type = object
        .info
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(size) = object.info.size {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    }

    Ok((headers, Body::from_stream(object.body)).into_response())
}
