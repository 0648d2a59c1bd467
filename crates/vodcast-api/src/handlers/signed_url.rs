use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use vodcast_core::AppError;
use vodcast_delivery::SignedUrl;

#[derive(Debug, Deserialize)]
pub struct SignedUrlQuery {
    /// Requested lifetime in seconds; clamped server-side.
    expires_in: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}/signed-url",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("expires_in" = Option<u64>, Query, description = "Lifetime in seconds (default 3600)")
    ),
    responses(
        (status = 200, description = "Signed playback URL", body = SignedUrl),
        (status = 400, description = "Video is on the local tier; signing unsupported", body = ErrorResponse),
        (status = 404, description = "Video or object not found", body = ErrorResponse)
    )
)]
pub async fn signed_url(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .catalog
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", id)))?;

    let signed = state
        .signer
        .issue(&record, query.expires_in.map(Duration::from_secs))
        .await?;
    Ok(Json(signed))
}
