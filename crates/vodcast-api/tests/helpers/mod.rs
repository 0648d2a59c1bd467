//! Shared test harness: a `TestServer` wired to in-memory backends so the
//! full HTTP surface runs without S3, Postgres, or ffmpeg.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use uuid::Uuid;
use vodcast_api::setup::routes::build_router;
use vodcast_api::state::AppState;
use vodcast_core::{Config, HlsStatus, StorageTier};
use vodcast_db::InMemoryVideoCatalog;
use vodcast_delivery::Segmenter;
use vodcast_storage::{
    ObjectByteStream, ObjectInfo, ObjectTier, TierError, TierResult, TierSet,
};

/// In-memory tier backend. Unlike the local-disk tier it supports presigned
/// URLs, so it can stand in for a cloud tier in the primary slot.
pub struct MemoryTier {
    tier: StorageTier,
    objects: Mutex<HashMap<String, Bytes>>,
}

impl MemoryTier {
    pub fn new(tier: StorageTier) -> Arc<Self> {
        Arc::new(Self {
            tier,
            objects: Mutex::new(HashMap::new()),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectTier for MemoryTier {
    fn id(&self) -> StorageTier {
        self.tier
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> TierResult<()> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn head(&self, key: &str) -> TierResult<ObjectInfo> {
        let objects = self.objects.lock().unwrap();
        match objects.get(key) {
            Some(data) => Ok(ObjectInfo {
                size_bytes: data.len() as u64,
            }),
            None => Err(TierError::NotFound(key.to_string())),
        }
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> TierResult<ObjectByteStream> {
        let data = {
            let objects = self.objects.lock().unwrap();
            objects
                .get(key)
                .cloned()
                .ok_or_else(|| TierError::NotFound(key.to_string()))?
        };
        if data.is_empty() || start >= data.len() as u64 {
            return Ok(Box::pin(futures::stream::empty()));
        }
        let end = end.min(data.len() as u64 - 1);
        let slice = data.slice(start as usize..=end as usize);
        Ok(Box::pin(futures::stream::once(async move { Ok(slice) })))
    }

    async fn delete(&self, key: &str) -> TierResult<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> TierResult<String> {
        // Mirror the real local tier: no URL scheme to sign.
        if self.tier == StorageTier::Local {
            return Err(TierError::Unsupported(
                "Local tier cannot presign URLs".to_string(),
            ));
        }
        if !self.contains(key) {
            return Err(TierError::NotFound(key.to_string()));
        }
        Ok(format!(
            "https://signed.test/{}?expires={}",
            key,
            expires_in.as_secs()
        ))
    }

    async fn delete_prefix(&self, prefix: &str) -> TierResult<()> {
        self.objects
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// Segmenter double that fabricates a playlist and two segments.
pub struct FakeSegmenter {
    pub fail: AtomicBool,
}

impl FakeSegmenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Segmenter for FakeSegmenter {
    async fn segment(&self, source: &Path, output_dir: &Path) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("injected segmenter failure");
        }
        tokio::fs::metadata(source).await?;
        tokio::fs::write(
            output_dir.join("playlist.m3u8"),
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:6.0,\nsegment_000.ts\n#EXTINF:6.0,\nsegment_001.ts\n#EXT-X-ENDLIST\n",
        )
        .await?;
        tokio::fs::write(output_dir.join("segment_000.ts"), vec![0x47u8; 188]).await?;
        tokio::fs::write(output_dir.join("segment_001.ts"), vec![0x47u8; 188]).await?;
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        database_url: None,
        primary_tier: None,
        secondary_tier: None,
        local_storage_path: "unused".to_string(),
        max_video_size_bytes: 64 * 1024 * 1024,
        video_allowed_extensions: vec!["mp4".into(), "mov".into(), "webm".into()],
        video_allowed_content_types: vec![
            "video/mp4".into(),
            "video/quicktime".into(),
            "video/webm".into(),
        ],
        ffmpeg_path: "ffmpeg".to_string(),
        hls_segment_duration: 6,
        signed_url_default_expiry_secs: 3600,
        signed_url_max_expiry_secs: 86_400,
        head_probe_timeout_ms: 1000,
        stream_buffer_bytes: 1024 * 1024,
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub segmenter: Arc<FakeSegmenter>,
    pub primary: Option<Arc<MemoryTier>>,
}

fn build_app(with_primary: bool) -> TestApp {
    let primary = with_primary.then(|| MemoryTier::new(StorageTier::Primary));
    let local = MemoryTier::new(StorageTier::Local);
    let tiers = TierSet::new(
        primary
            .clone()
            .map(|t| t as Arc<dyn ObjectTier>),
        None,
        local,
    );
    let catalog = Arc::new(InMemoryVideoCatalog::new());
    let segmenter = FakeSegmenter::new();
    let state = Arc::new(AppState::new(
        test_config(),
        tiers,
        catalog,
        segmenter.clone(),
    ));
    let server = TestServer::new(build_router(state)).unwrap();
    TestApp {
        server,
        segmenter,
        primary,
    }
}

/// App whose only tier is in-memory local disk (no presigning).
pub fn spawn_app() -> TestApp {
    build_app(false)
}

/// App with a presign-capable tier in the primary slot.
pub fn spawn_app_with_primary() -> TestApp {
    build_app(true)
}

pub fn video_form(filename: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data)
            .file_name(filename)
            .mime_type("video/mp4"),
    )
}

/// Upload a video and return its id.
pub async fn upload_video(app: &TestApp, filename: &str, data: Vec<u8>) -> Uuid {
    let response = app
        .server
        .post("/api/v0/videos")
        .multipart(video_form(filename, data))
        .await;
    response.assert_status(http::StatusCode::CREATED);
    let record: serde_json::Value = response.json();
    record["id"].as_str().unwrap().parse().unwrap()
}

/// Poll the record until `hls_status` leaves `processing`/`none`.
pub async fn wait_for_hls(app: &TestApp, id: Uuid) -> HlsStatus {
    for _ in 0..100 {
        let response = app.server.get(&format!("/api/v0/videos/{}", id)).await;
        response.assert_status_ok();
        let record: serde_json::Value = response.json();
        match record["hls_status"].as_str() {
            Some("ready") => return HlsStatus::Ready,
            Some("failed") => return HlsStatus::Failed,
            _ => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("HLS packaging did not finish");
}
