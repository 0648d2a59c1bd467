//! Tier resolution for read-side operations.
//!
//! Streaming, signing, packaging and deletion all need to answer the same
//! question first: which tier holds this video's bytes, and how big is the
//! object? Records carry the answer; records created before tier tracking
//! existed do not, and for those the tiers are probed in fallback order and
//! the discovery is persisted.
//!
//! There is no cross-tier fallback once a tier is recorded: a missing object
//! at the recorded tier is a hard `NotFound`, never a silent read from
//! elsewhere.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use vodcast_core::{AppError, StorageTier, VideoRecord};
use vodcast_db::VideoCatalog;
use vodcast_storage::{keys, ObjectInfo, ObjectTier, TierSet};

/// Where a video's source bytes live.
pub struct ResolvedSource {
    pub tier: StorageTier,
    pub backend: Arc<dyn ObjectTier>,
    pub key: String,
    pub size_bytes: u64,
}

impl std::fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("tier", &self.tier)
            .field("key", &self.key)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Resolve the tier and size for a record's source object.
///
/// Existence is always confirmed with a `head` (bounded by `probe_timeout`)
/// before the caller opens any transfer. A measured size is written back to
/// the catalog when the record is missing one; write-back failures are
/// logged and ignored, the in-hand size is still returned.
pub(crate) async fn resolve_source(
    tiers: &TierSet,
    catalog: &dyn VideoCatalog,
    record: &VideoRecord,
    probe_timeout: Duration,
) -> Result<ResolvedSource, AppError> {
    let key = keys::source_key(record.id, &record.original_filename);

    if let Some(tier) = record.storage_tier {
        let backend = Arc::clone(tiers.require(tier)?);
        let info = timed_head(backend.as_ref(), &key, probe_timeout).await?;
        backfill_size(catalog, record, info.size_bytes).await;
        return Ok(ResolvedSource {
            tier,
            backend,
            key,
            size_bytes: info.size_bytes,
        });
    }

    // Legacy record: probe primary → secondary → local, persist the first hit.
    for (slot, backend) in tiers.in_fallback_order() {
        match timeout(probe_timeout, backend.head(&key)).await {
            Ok(Ok(info)) => {
                tracing::info!(
                    video_id = %record.id,
                    tier = %slot,
                    size_bytes = info.size_bytes,
                    "Discovered storage tier for legacy record"
                );
                if let Err(e) = catalog.update_storage_tier(record.id, slot).await {
                    tracing::warn!(
                        video_id = %record.id,
                        tier = %slot,
                        error = %e,
                        "Failed to persist discovered storage tier"
                    );
                }
                backfill_size(catalog, record, info.size_bytes).await;
                return Ok(ResolvedSource {
                    tier: slot,
                    backend: Arc::clone(backend),
                    key,
                    size_bytes: info.size_bytes,
                });
            }
            Ok(Err(e)) if e.is_not_found() => continue,
            Ok(Err(e)) => {
                tracing::warn!(video_id = %record.id, tier = %slot, error = %e, "Tier probe failed");
                continue;
            }
            Err(_) => {
                tracing::warn!(video_id = %record.id, tier = %slot, "Tier probe timed out");
                continue;
            }
        }
    }

    Err(AppError::NotFound(format!(
        "Video object not found on any tier: {}",
        record.id
    )))
}

async fn timed_head(
    backend: &dyn ObjectTier,
    key: &str,
    probe_timeout: Duration,
) -> Result<ObjectInfo, AppError> {
    match timeout(probe_timeout, backend.head(key)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Tier(format!(
            "Head probe timed out for key: {}",
            key
        ))),
    }
}

async fn backfill_size(catalog: &dyn VideoCatalog, record: &VideoRecord, size_bytes: u64) {
    if record.file_size_bytes.is_some() {
        return;
    }
    if let Err(e) = catalog.update_file_size(record.id, size_bytes as i64).await {
        tracing::warn!(video_id = %record.id, error = %e, "Failed to backfill file size");
    }
}
