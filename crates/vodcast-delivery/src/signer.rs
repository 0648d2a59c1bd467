//! Time-boxed signed playback URLs.
//!
//! Signing delegates to the tier holding the bytes, so it only works for
//! videos on a cloud tier; the local tier has no URL scheme to sign and the
//! caller gets `Unsupported`. The object's existence is confirmed before
//! signing so a URL for a missing object is never minted.
//!
//! Signing is stateless. A minted URL cannot be revoked before it expires.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;
use vodcast_core::{AppError, VideoRecord};
use vodcast_db::VideoCatalog;
use vodcast_storage::TierSet;

use crate::resolve::resolve_source;

/// Floor for a requested expiry; anything shorter is useless to a player.
const MIN_EXPIRY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignedUrl {
    pub url: String,
    /// Effective lifetime in seconds after clamping.
    pub expires_in_secs: u64,
}

pub struct SignedUrlIssuer {
    tiers: TierSet,
    catalog: Arc<dyn VideoCatalog>,
    probe_timeout: Duration,
    default_expiry: Duration,
    max_expiry: Duration,
}

impl SignedUrlIssuer {
    pub fn new(
        tiers: TierSet,
        catalog: Arc<dyn VideoCatalog>,
        probe_timeout: Duration,
        default_expiry: Duration,
        max_expiry: Duration,
    ) -> Self {
        Self {
            tiers,
            catalog,
            probe_timeout,
            default_expiry,
            max_expiry,
        }
    }

    /// Mint a read-only URL for the video's source object, valid for
    /// `expires_in` (default when `None`, clamped to the configured bounds).
    pub async fn issue(
        &self,
        record: &VideoRecord,
        expires_in: Option<Duration>,
    ) -> Result<SignedUrl, AppError> {
        let expiry = expires_in
            .unwrap_or(self.default_expiry)
            .clamp(MIN_EXPIRY, self.max_expiry);

        let resolved = resolve_source(
            &self.tiers,
            self.catalog.as_ref(),
            record,
            self.probe_timeout,
        )
        .await?;

        let url = resolved.backend.presign_get(&resolved.key, expiry).await?;

        tracing::info!(
            video_id = %record.id,
            tier = %resolved.tier,
            expires_in_secs = expiry.as_secs(),
            "Issued signed URL"
        );
        Ok(SignedUrl {
            url,
            expires_in_secs: expiry.as_secs(),
        })
    }
}
