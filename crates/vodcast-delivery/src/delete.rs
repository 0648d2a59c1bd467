//! Best-effort deletion across the tier hierarchy.
//!
//! Only one tier holds the source bytes, but which one may be stale for
//! legacy records, so the sweep hits every available tier unconditionally
//! rather than trusting the record. Tier failures are logged and skipped;
//! the catalog record is removed last so a crashed sweep can be retried.
//! Tier deletes are idempotent, which is what makes concurrent or repeated
//! deletes harmless at the byte layer.

use std::sync::Arc;

use uuid::Uuid;
use vodcast_core::AppError;
use vodcast_db::VideoCatalog;
use vodcast_storage::{keys, TierSet};

pub struct DeletionCoordinator {
    tiers: TierSet,
    catalog: Arc<dyn VideoCatalog>,
}

impl DeletionCoordinator {
    pub fn new(tiers: TierSet, catalog: Arc<dyn VideoCatalog>) -> Self {
        Self { tiers, catalog }
    }

    /// Remove the video's bytes, HLS artifacts, and catalog record.
    /// Returns whether a record existed; byte-layer misses never fail the
    /// operation.
    pub async fn delete(&self, video_id: Uuid) -> Result<bool, AppError> {
        let Some(record) = self.catalog.get(video_id).await? else {
            return Ok(false);
        };

        let source_key = keys::source_key(video_id, &record.original_filename);
        let hls_prefix = keys::hls_prefix(video_id);

        for (slot, backend) in self.tiers.in_fallback_order() {
            if let Err(e) = backend.delete(&source_key).await {
                tracing::warn!(
                    video_id = %video_id,
                    tier = %slot,
                    key = %source_key,
                    error = %e,
                    "Source delete failed, continuing sweep"
                );
            }
            if let Err(e) = backend.delete_prefix(&hls_prefix).await {
                tracing::warn!(
                    video_id = %video_id,
                    tier = %slot,
                    error = %e,
                    "HLS artifact sweep failed, continuing"
                );
            }
        }

        let existed = self.catalog.delete(video_id).await?;
        tracing::info!(video_id = %video_id, "Video deleted");
        Ok(existed)
    }
}
