use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;
use vodcast_core::AppError;
use vodcast_delivery::PlaybackStatus;

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}/stream",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("Range" = Option<String>, Header, description = "Byte range, e.g. bytes=0-1048575")
    ),
    responses(
        (status = 200, description = "Full video body"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 416, description = "Range starts beyond the end of the object", body = ErrorResponse)
    )
)]
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let record = state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    let playback = state.streamer.stream(&record, range_header).await?;

    let status = match playback.status {
        PlaybackStatus::Full => StatusCode::OK,
        PlaybackStatus::Partial => StatusCode::PARTIAL_CONTENT,
    };

    let body_stream = playback
        .stream
        .map(|result| result.map_err(|e| std::io::Error::other(e.to_string())));

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, playback.content_type)
        .header(header::CONTENT_LENGTH, playback.content_length);
    if let Some(content_range) = &playback.content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    builder
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
