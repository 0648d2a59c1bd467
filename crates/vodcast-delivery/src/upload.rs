//! Upload coordination across the tier hierarchy.
//!
//! One authoritative copy: the coordinator walks the tiers in fixed order
//! (primary → secondary → local), the first successful `put` wins and is
//! recorded on the new `VideoRecord`. A tier failure during the walk is a
//! warning, not an error; only exhausting every tier fails the upload, and
//! in that case no record is created.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;
use vodcast_core::{AppError, HlsStatus, StorageTier, VideoRecord};
use vodcast_db::VideoCatalog;
use vodcast_storage::{keys, TierSet};

/// Payload handed to the coordinator. Larger uploads are spooled to disk by
/// the HTTP layer before they reach the engine.
pub enum UploadSource {
    Bytes(Bytes),
    /// Temp file holding the upload; removed after a successful store.
    SpooledFile(PathBuf),
}

pub struct UploadRequest {
    pub filename: String,
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
    pub owner_id: Option<Uuid>,
    pub content_type: String,
    pub source: UploadSource,
}

pub struct UploadCoordinator {
    tiers: TierSet,
    catalog: Arc<dyn VideoCatalog>,
}

impl UploadCoordinator {
    pub fn new(tiers: TierSet, catalog: Arc<dyn VideoCatalog>) -> Self {
        Self { tiers, catalog }
    }

    /// Store the upload on the first tier that accepts it and insert the
    /// catalog record. Returns the record as inserted.
    pub async fn upload(&self, request: UploadRequest) -> Result<VideoRecord, AppError> {
        let video_id = Uuid::new_v4();
        let filename = keys::sanitize_filename(&request.filename);
        let key = keys::source_key(video_id, &filename);

        let (data, spool) = match request.source {
            UploadSource::Bytes(bytes) => (bytes, None),
            UploadSource::SpooledFile(path) => {
                let contents = tokio::fs::read(&path).await.map_err(|e| {
                    AppError::Internal(format!("Failed to read spooled upload: {}", e))
                })?;
                (Bytes::from(contents), Some(path))
            }
        };
        let size_bytes = data.len() as i64;

        let stored_tier = self.store_with_fallback(&key, data, &request.content_type).await?;

        let record = VideoRecord {
            id: video_id,
            owner_id: request.owner_id,
            original_filename: filename.clone(),
            title: request
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| VideoRecord::title_from_filename(&filename)),
            duration_seconds: request.duration_seconds,
            file_size_bytes: Some(size_bytes),
            storage_tier: Some(stored_tier),
            hls_status: HlsStatus::None,
            hls_playlist_key: None,
            uploaded_at: Utc::now(),
        };
        if let Err(e) = self.catalog.insert(&record).await {
            // Do not leave orphan bytes behind a failed insert.
            if let Ok(backend) = self.tiers.require(stored_tier) {
                if let Err(del) = backend.delete(&key).await {
                    tracing::warn!(key = %key, error = %del, "Failed to remove orphan upload");
                }
            }
            return Err(e);
        }

        if let Some(path) = spool {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(video_id = %video_id, error = %e, "Failed to remove upload spool file");
            }
        }

        tracing::info!(
            video_id = %video_id,
            key = %key,
            tier = %stored_tier,
            size_bytes,
            "Video uploaded"
        );
        Ok(record)
    }

    /// Walk the fallback order until one tier holds the bytes.
    async fn store_with_fallback(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StorageTier, AppError> {
        for (slot, backend) in self.tiers.in_fallback_order() {
            match backend.put(key, data.clone(), content_type).await {
                Ok(()) => return Ok(slot),
                Err(e) => {
                    tracing::warn!(
                        key = %key,
                        tier = %slot,
                        error = %e,
                        "Tier rejected upload, falling back"
                    );
                }
            }
        }
        Err(AppError::Exhausted(format!(
            "No storage tier accepted key: {}",
            key
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryTier;
    use std::sync::atomic::Ordering;
    use vodcast_db::InMemoryVideoCatalog;

    fn request(filename: &str) -> UploadRequest {
        UploadRequest {
            filename: filename.to_string(),
            title: None,
            duration_seconds: Some(12.5),
            owner_id: None,
            content_type: "video/mp4".to_string(),
            source: UploadSource::Bytes(Bytes::from_static(b"not really mp4")),
        }
    }

    #[tokio::test]
    async fn test_primary_wins_when_healthy() {
        let primary = MemoryTier::new(StorageTier::Primary);
        let local = MemoryTier::new(StorageTier::Local);
        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let coordinator = UploadCoordinator::new(
            TierSet::new(Some(primary.clone()), None, local.clone()),
            catalog.clone(),
        );

        let record = coordinator.upload(request("talk.mp4")).await.unwrap();
        assert_eq!(record.storage_tier, Some(StorageTier::Primary));
        assert_eq!(record.file_size_bytes, Some(14));
        assert_eq!(record.title, "talk");

        let key = keys::source_key(record.id, "talk.mp4");
        assert!(primary.contains(&key));
        assert!(!local.contains(&key));
        assert!(catalog.get(record.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_secondary_wins_when_primary_rejects() {
        let primary = MemoryTier::new(StorageTier::Primary);
        let secondary = MemoryTier::new(StorageTier::Secondary);
        let local = MemoryTier::new(StorageTier::Local);
        primary.fail_puts.store(true, Ordering::SeqCst);

        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let coordinator = UploadCoordinator::new(
            TierSet::new(Some(primary.clone()), Some(secondary.clone()), local.clone()),
            catalog.clone(),
        );

        let record = coordinator.upload(request("talk.mp4")).await.unwrap();
        assert_eq!(record.storage_tier, Some(StorageTier::Secondary));

        let key = keys::source_key(record.id, "talk.mp4");
        assert!(secondary.contains(&key));
        assert!(!primary.contains(&key));
        assert!(!local.contains(&key));
        assert_eq!(
            catalog.get(record.id).await.unwrap().unwrap().storage_tier,
            Some(StorageTier::Secondary)
        );
    }

    #[tokio::test]
    async fn test_fallback_skips_failing_tiers() {
        let primary = MemoryTier::new(StorageTier::Primary);
        let secondary = MemoryTier::new(StorageTier::Secondary);
        let local = MemoryTier::new(StorageTier::Local);
        primary.fail_puts.store(true, Ordering::SeqCst);
        secondary.fail_puts.store(true, Ordering::SeqCst);

        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let coordinator = UploadCoordinator::new(
            TierSet::new(Some(primary), Some(secondary), local.clone()),
            catalog,
        );

        let record = coordinator.upload(request("talk.mp4")).await.unwrap();
        assert_eq!(record.storage_tier, Some(StorageTier::Local));
        assert!(local.contains(&keys::source_key(record.id, "talk.mp4")));
    }

    #[tokio::test]
    async fn test_exhaustion_creates_no_record() {
        let local = MemoryTier::new(StorageTier::Local);
        local.fail_puts.store(true, Ordering::SeqCst);

        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let coordinator =
            UploadCoordinator::new(TierSet::new(None, None, local), catalog.clone());

        let err = coordinator.upload(request("talk.mp4")).await.unwrap_err();
        assert!(matches!(err, AppError::Exhausted(_)));
        assert!(catalog.list(10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spooled_upload_removes_spool_file() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().join("upload-spool.tmp");
        tokio::fs::write(&spool, vec![3u8; 2048]).await.unwrap();

        let local = MemoryTier::new(StorageTier::Local);
        let catalog = Arc::new(InMemoryVideoCatalog::new());
        let coordinator =
            UploadCoordinator::new(TierSet::new(None, None, local.clone()), catalog);

        let record = coordinator
            .upload(UploadRequest {
                filename: "spooled.mp4".to_string(),
                title: Some("Keynote".to_string()),
                duration_seconds: None,
                owner_id: None,
                content_type: "video/mp4".to_string(),
                source: UploadSource::SpooledFile(spool.clone()),
            })
            .await
            .unwrap();

        assert_eq!(record.title, "Keynote");
        assert_eq!(record.file_size_bytes, Some(2048));
        assert!(!spool.exists());
        assert!(local.contains(&keys::source_key(record.id, "spooled.mp4")));
    }
}
