use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use uuid::Uuid;
use vodcast_core::{AppError, VideoRecord};
use vodcast_delivery::{UploadRequest, UploadSource};

struct UploadForm {
    filename: String,
    content_type: String,
    data: Bytes,
    title: Option<String>,
    duration_seconds: Option<f64>,
    owner_id: Option<Uuid>,
}

async fn read_multipart(
    mut multipart: Multipart,
    max_size_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut file: Option<(String, String, Bytes)> = None;
    let mut title = None;
    let mut duration_seconds = None;
    let mut owner_id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::InvalidInput("File field has no filename".into()))?;
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read file field: {}", e))
                })?;
                if data.len() > max_size_bytes {
                    return Err(AppError::PayloadTooLarge(format!(
                        "{} bytes exceeds the {} byte limit",
                        data.len(),
                        max_size_bytes
                    )));
                }
                file = Some((filename, content_type, data));
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Invalid title field: {}", e))
                })?);
            }
            Some("duration_seconds") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Invalid duration field: {}", e))
                })?;
                duration_seconds = Some(text.trim().parse::<f64>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid duration_seconds: {}", text))
                })?);
            }
            Some("owner_id") => {
                let text = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Invalid owner_id field: {}", e))
                })?;
                owner_id = Some(text.trim().parse::<Uuid>().map_err(|_| {
                    AppError::InvalidInput(format!("Invalid owner_id: {}", text))
                })?);
            }
            _ => {}
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| AppError::InvalidInput("Missing 'file' field".into()))?;
    if data.is_empty() {
        return Err(AppError::InvalidInput("Uploaded file is empty".into()));
    }
    Ok(UploadForm {
        filename,
        content_type,
        data,
        title,
        duration_seconds,
        owner_id,
    })
}

fn validate_video_kind(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
    allowed_content_types: &[String],
) -> Result<(), AppError> {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !allowed_extensions.iter().any(|e| e == &extension) {
        return Err(AppError::InvalidInput(format!(
            "File extension not allowed: {}",
            extension
        )));
    }
    let content_type = content_type.to_ascii_lowercase();
    if content_type != "application/octet-stream"
        && !allowed_content_types.iter().any(|c| c == &content_type)
    {
        return Err(AppError::InvalidInput(format!(
            "Content type not allowed: {}",
            content_type
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded", body = VideoRecord),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "All storage tiers unavailable", body = ErrorResponse)
    )
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_multipart(multipart, state.config.max_video_size_bytes).await?;
    validate_video_kind(
        &form.filename,
        &form.content_type,
        &state.config.video_allowed_extensions,
        &state.config.video_allowed_content_types,
    )?;

    let record = state
        .uploader
        .upload(UploadRequest {
            filename: form.filename,
            title: form.title,
            duration_seconds: form.duration_seconds,
            owner_id: form.owner_id,
            content_type: form.content_type,
            source: UploadSource::Bytes(form.data),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}
