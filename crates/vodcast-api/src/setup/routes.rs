//! Route table and HTTP middleware.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use vodcast_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers::{
    health::health,
    signed_url::signed_url,
    video_delete::delete_video,
    video_get::{get_video, list_videos},
    video_hls::{get_hls_artifact, start_hls_packaging},
    video_stream::stream_video,
    video_upload::upload_video,
};
use crate::state::AppState;

/// Slack on top of the raw video size for multipart framing and the other
/// form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_video_size_bytes + MULTIPART_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health))
        .route(
            "/api-doc/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .route("/api/v0/videos", post(upload_video).get(list_videos))
        .route(
            "/api/v0/videos/{id}",
            get(get_video).delete(delete_video),
        )
        .route("/api/v0/videos/{id}/stream", get(stream_video))
        .route("/api/v0/videos/{id}/signed-url", get(signed_url))
        .route("/api/v0/videos/{id}/hls", post(start_hls_packaging))
        .route("/api/v0/videos/{id}/hls/{filename}", get(get_hls_artifact))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
