use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;
use vodcast_core::AppError;

#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/hls",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 202, description = "Packaging started; poll the record's hls_status"),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn start_hls_packaging(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Reject unknown ids up front; the packaging itself runs detached and
    // records its outcome in the catalog.
    state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;

    let task_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = task_state.packager.package(id).await {
            tracing::error!(video_id = %id, error = %e, "HLS packaging task failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "video_id": id, "hls_status": "processing" })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}/hls/{filename}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("filename" = String, Path, description = "Manifest or segment filename")
    ),
    responses(
        (status = 200, description = "HLS artifact"),
        (status = 400, description = "Invalid artifact name", body = ErrorResponse),
        (status = 404, description = "Video not found or not packaged", body = ErrorResponse)
    )
)]
pub async fn get_hls_artifact(
    State(state): State<Arc<AppState>>,
    Path((id, filename)): Path<(Uuid, String)>,
) -> Result<Response, HttpAppError> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(AppError::InvalidInput(format!("Invalid artifact name: {}", filename)).into());
    }

    let record = state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;
    let artifact = state.packager.open_artifact(&record, &filename).await?;

    let body_stream = artifact
        .stream
        .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.content_type)
        .header(header::CONTENT_LENGTH, artifact.content_length)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
