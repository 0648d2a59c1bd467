//! Shared fixtures for engine tests: an in-memory `ObjectTier` with
//! failure injection and chunk accounting, plus record builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;
use vodcast_core::{HlsStatus, StorageTier, VideoRecord};
use vodcast_storage::{ObjectByteStream, ObjectInfo, ObjectTier, TierError, TierResult};

/// Chunk size a `MemoryTier` range read yields, deliberately small so tests
/// can observe buffering and cancellation at chunk granularity.
pub(crate) const MEMORY_CHUNK_BYTES: usize = 4096;

pub(crate) struct MemoryTier {
    tier: StorageTier,
    objects: Mutex<HashMap<String, Bytes>>,
    /// Every `put` fails with a transient backend error while set.
    pub fail_puts: AtomicBool,
    /// Every `delete`/`delete_prefix` fails while set.
    pub fail_deletes: AtomicBool,
    /// `presign_get` returns `Unsupported` while unset.
    pub presign_supported: AtomicBool,
    /// Chunks pulled off range-read streams so far, across all reads.
    pub chunks_served: Arc<AtomicUsize>,
}

impl MemoryTier {
    pub fn new(tier: StorageTier) -> Arc<Self> {
        Arc::new(Self {
            tier,
            objects: Mutex::new(HashMap::new()),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            presign_supported: AtomicBool::new(true),
            chunks_served: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectTier for MemoryTier {
    fn id(&self) -> StorageTier {
        self.tier
    }

    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> TierResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(TierError::Backend("injected put failure".to_string()));
        }
        self.insert(key, data);
        Ok(())
    }

    async fn head(&self, key: &str) -> TierResult<ObjectInfo> {
        match self.object(key) {
            Some(data) => Ok(ObjectInfo {
                size_bytes: data.len() as u64,
            }),
            None => Err(TierError::NotFound(key.to_string())),
        }
    }

    async fn get_range(&self, key: &str, start: u64, end: u64) -> TierResult<ObjectByteStream> {
        let data = self
            .object(key)
            .ok_or_else(|| TierError::NotFound(key.to_string()))?;
        if data.is_empty() || start >= data.len() as u64 {
            return Ok(Box::pin(futures::stream::empty()));
        }
        let end = end.min(data.len() as u64 - 1);
        let slice = data.slice(start as usize..=end as usize);
        let counter = Arc::clone(&self.chunks_served);

        // Yield one small chunk per poll, with a short pause so a cancelled
        // reader is observable mid-stream.
        let stream = futures::stream::unfold(slice, move |mut remaining| {
            let counter = Arc::clone(&counter);
            async move {
                if remaining.is_empty() {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
                let take = remaining.len().min(MEMORY_CHUNK_BYTES);
                let chunk = remaining.split_to(take);
                counter.fetch_add(1, Ordering::SeqCst);
                Some((Ok(chunk), remaining))
            }
        });
        Ok(Box::pin(stream))
    }

    async fn delete(&self, key: &str) -> TierResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TierError::Backend("injected delete failure".to_string()));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> TierResult<String> {
        if !self.presign_supported.load(Ordering::SeqCst) {
            return Err(TierError::Unsupported(
                "presigned URLs not supported".to_string(),
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
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TierError::Backend("injected delete failure".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// A record as the upload path would insert it, bytes already on `tier`.
pub(crate) fn record_on_tier(filename: &str, tier: Option<StorageTier>) -> VideoRecord {
    VideoRecord {
        id: Uuid::new_v4(),
        owner_id: None,
        original_filename: filename.to_string(),
        title: VideoRecord::title_from_filename(filename),
        duration_seconds: Some(42.0),
        file_size_bytes: None,
        storage_tier: tier,
        hls_status: HlsStatus::None,
        hls_playlist_key: None,
        uploaded_at: Utc::now(),
    }
}
