use crate::traits::{ObjectByteStream, ObjectInfo, ObjectTier, TierError, TierResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use uuid::Uuid;
use vodcast_core::StorageTier;

/// Chunk size for local range reads.
const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Local filesystem tier, the disk-last-resort backend.
#[derive(Clone)]
pub struct LocalDiskTier {
    base_path: PathBuf,
}

impl LocalDiskTier {
    /// Create a local tier rooted at `base_path` (created if missing).
    pub async fn new(base_path: impl Into<PathBuf>) -> TierResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            TierError::Backend(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalDiskTier { base_path })
    }

    /// Convert a storage key to a filesystem path, rejecting keys that could
    /// escape the base directory.
    fn key_to_path(&self, key: &str) -> TierResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(TierError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> TierResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectTier for LocalDiskTier {
    fn id(&self) -> StorageTier {
        StorageTier::Local
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> TierResult<()> {
        let path = self.key_to_path(key)?;
        let size = data.len();
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        // Write to a temp file then rename so a failed write never leaves a
        // partial object visible to `get_range`.
        let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));

        let write_result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &path).await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(TierError::PutFailed(format!(
                "Failed to write file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            tier = %self.id(),
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local tier put successful"
        );

        Ok(())
    }

    async fn head(&self, key: &str) -> TierResult<ObjectInfo> {
        let path = self.key_to_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(ObjectInfo {
                size_bytes: meta.len(),
            }),
            Ok(_) => Err(TierError::NotFound(key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TierError::NotFound(key.to_string()))
            }
            Err(e) => Err(TierError::Backend(e.to_string())),
        }
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> TierResult<ObjectByteStream> {
        let path = self.key_to_path(key)?;

        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TierError::NotFound(key.to_string()));
            }
            Err(e) => {
                return Err(TierError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| TierError::ReadFailed(e.to_string()))?;

        // end is inclusive
        let limited = file.take(end - start + 1);
        let reader = ReaderStream::with_capacity(limited, READ_CHUNK_BYTES);

        let stream = reader.map(|result| {
            result.map_err(|e| TierError::ReadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> TierResult<()> {
        let path = self.key_to_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(
                    tier = %self.id(),
                    path = %path.display(),
                    key = %key,
                    "Local tier delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TierError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn presign_get(&self, _key: &str, _expires_in: Duration) -> TierResult<String> {
        Err(TierError::Unsupported(
            "local disk tier cannot issue signed URLs".to_string(),
        ))
    }

    async fn delete_prefix(&self, prefix: &str) -> TierResult<()> {
        let dir = self.key_to_path(prefix.trim_end_matches('/'))?;

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(
                    tier = %self.id(),
                    path = %dir.display(),
                    prefix = %prefix,
                    "Local tier prefix delete successful"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TierError::DeleteFailed(format!(
                "Failed to delete directory {}: {}",
                dir.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn collect(mut stream: ObjectByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_put_then_full_range_round_trips() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        tier.put("videos/a/talk.mp4", Bytes::from(payload.clone()), "video/mp4")
            .await
            .unwrap();

        let info = tier.head("videos/a/talk.mp4").await.unwrap();
        assert_eq!(info.size_bytes, payload.len() as u64);

        let stream = tier
            .get_range("videos/a/talk.mp4", 0, info.size_bytes - 1)
            .await
            .unwrap();
        assert_eq!(collect(stream).await, payload);
    }

    #[tokio::test]
    async fn test_range_read_is_inclusive_and_exact() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        let payload: Vec<u8> = (0u8..=255).collect();
        tier.put("videos/b/x.bin", Bytes::from(payload.clone()), "video/mp4")
            .await
            .unwrap();

        let stream = tier.get_range("videos/b/x.bin", 10, 19).await.unwrap();
        let got = collect(stream).await;
        assert_eq!(got.len(), 10);
        assert_eq!(got, &payload[10..=19]);
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        tier.put("videos/c/v.mp4", Bytes::from_static(b"abc"), "video/mp4")
            .await
            .unwrap();

        let mut entries = tokio::fs::read_dir(dir.path().join("videos/c")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["v.mp4"]);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        let result = tier.head("../../../etc/passwd").await;
        assert!(matches!(result, Err(TierError::InvalidKey(_))));

        let result = tier.delete("/etc/passwd").await;
        assert!(matches!(result, Err(TierError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        tier.put("videos/d/v.mp4", Bytes::from_static(b"data"), "video/mp4")
            .await
            .unwrap();

        tier.delete("videos/d/v.mp4").await.unwrap();
        // Second delete of the same key succeeds.
        tier.delete("videos/d/v.mp4").await.unwrap();
        assert!(tier.head("videos/d/v.mp4").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_head_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();
        assert!(tier.head("videos/none.mp4").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_presign_unsupported() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();
        let result = tier
            .presign_get("videos/e/v.mp4", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(TierError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_delete_prefix_removes_artifacts() {
        let dir = tempdir().unwrap();
        let tier = LocalDiskTier::new(dir.path()).await.unwrap();

        let id = Uuid::new_v4();
        let prefix = format!("hls/{}/", id);
        tier.put(
            &format!("hls/{}/playlist.m3u8", id),
            Bytes::from_static(b"#EXTM3U"),
            "application/vnd.apple.mpegurl",
        )
        .await
        .unwrap();
        tier.put(
            &format!("hls/{}/segment_000.ts", id),
            Bytes::from_static(b"ts"),
            "video/mp2t",
        )
        .await
        .unwrap();

        tier.delete_prefix(&prefix).await.unwrap();
        assert!(tier
            .head(&format!("hls/{}/playlist.m3u8", id))
            .await
            .unwrap_err()
            .is_not_found());

        // Deleting an already-empty prefix is fine.
        tier.delete_prefix(&prefix).await.unwrap();
    }
}
