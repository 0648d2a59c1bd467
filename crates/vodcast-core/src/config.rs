//! Configuration module
//!
//! Env-driven configuration for the engine and API. Tier clients are
//! constructed once at startup from this struct and injected; an
//! unconfigured cloud tier is an explicit `None`, not a null-check scattered
//! through call sites.

use std::env;

// Defaults
const SERVER_PORT: u16 = 4000;
const MAX_VIDEO_SIZE_MB: usize = 2048;
const HLS_SEGMENT_DURATION_SECS: u64 = 6;
const SIGNED_URL_DEFAULT_EXPIRY_SECS: u64 = 3600;
const SIGNED_URL_MAX_EXPIRY_SECS: u64 = 7 * 24 * 3600;
const HEAD_PROBE_TIMEOUT_MS: u64 = 3000;
const STREAM_BUFFER_BYTES: usize = 1024 * 1024;

/// Configuration for one S3-compatible tier (bucket + region, optional
/// custom endpoint for MinIO / DigitalOcean Spaces style providers).
#[derive(Clone, Debug)]
pub struct S3TierConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    /// Postgres catalog. `None` runs the engine with the in-memory catalog
    /// (single-node deployments and tests).
    pub database_url: Option<String>,
    /// Primary cloud tier; `None` means the tier is unavailable.
    pub primary_tier: Option<S3TierConfig>,
    /// Secondary cloud tier; `None` means the tier is unavailable.
    pub secondary_tier: Option<S3TierConfig>,
    /// Local-disk tier base path. Always available (disk last resort).
    pub local_storage_path: String,
    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub ffmpeg_path: String,
    pub hls_segment_duration: u64,
    pub signed_url_default_expiry_secs: u64,
    pub signed_url_max_expiry_secs: u64,
    /// Short timeout for tier-discovery and existence `head` probes;
    /// existence checks must not stall behind a slow tier.
    pub head_probe_timeout_ms: u64,
    /// Capacity of the bounded relay buffer between a tier read and the
    /// playback sink.
    pub stream_buffer_bytes: usize,
}

fn s3_tier_from_env(prefix: &str) -> Option<S3TierConfig> {
    let bucket = env::var(format!("{}_S3_BUCKET", prefix)).ok()?;
    let region = env::var(format!("{}_S3_REGION", prefix))
        .or_else(|_| env::var("AWS_REGION"))
        .ok()?;
    let endpoint = env::var(format!("{}_S3_ENDPOINT", prefix)).ok();
    Some(S3TierConfig {
        bucket,
        region,
        endpoint,
    })
}

fn csv_env(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .unwrap_or(SERVER_PORT),
            cors_origins: csv_env("CORS_ORIGINS", "*"),
            database_url: env::var("DATABASE_URL").ok(),
            primary_tier: s3_tier_from_env("PRIMARY"),
            secondary_tier: s3_tier_from_env("SECONDARY"),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "data/videos".to_string()),
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            video_allowed_extensions: csv_env(
                "VIDEO_ALLOWED_EXTENSIONS",
                "mp4,mov,webm,mkv,avi",
            ),
            video_allowed_content_types: csv_env(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                "video/mp4,video/quicktime,video/webm,video/x-matroska,video/x-msvideo",
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            hls_segment_duration: env::var("HLS_SEGMENT_DURATION")
                .unwrap_or_else(|_| HLS_SEGMENT_DURATION_SECS.to_string())
                .parse()
                .unwrap_or(HLS_SEGMENT_DURATION_SECS),
            signed_url_default_expiry_secs: env::var("SIGNED_URL_DEFAULT_EXPIRY_SECS")
                .unwrap_or_else(|_| SIGNED_URL_DEFAULT_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_DEFAULT_EXPIRY_SECS),
            signed_url_max_expiry_secs: env::var("SIGNED_URL_MAX_EXPIRY_SECS")
                .unwrap_or_else(|_| SIGNED_URL_MAX_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_MAX_EXPIRY_SECS),
            head_probe_timeout_ms: env::var("HEAD_PROBE_TIMEOUT_MS")
                .unwrap_or_else(|_| HEAD_PROBE_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(HEAD_PROBE_TIMEOUT_MS),
            stream_buffer_bytes: env::var("STREAM_BUFFER_BYTES")
                .unwrap_or_else(|_| STREAM_BUFFER_BYTES.to_string())
                .parse()
                .unwrap_or(STREAM_BUFFER_BYTES),
        })
    }
}
