//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health,
        crate::handlers::video_upload::upload_video,
        crate::handlers::video_get::get_video,
        crate::handlers::video_get::list_videos,
        crate::handlers::video_stream::stream_video,
        crate::handlers::signed_url::signed_url,
        crate::handlers::video_hls::start_hls_packaging,
        crate::handlers::video_hls::get_hls_artifact,
        crate::handlers::video_delete::delete_video,
    ),
    components(schemas(
        vodcast_core::VideoRecord,
        vodcast_core::StorageTier,
        vodcast_core::HlsStatus,
        vodcast_delivery::SignedUrl,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "videos", description = "Video storage and delivery"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;
