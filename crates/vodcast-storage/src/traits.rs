//! Storage tier abstraction trait
//!
//! Every tier backend (S3 primary, S3 secondary, local disk) implements
//! `ObjectTier`. The engine works against this trait only and never couples
//! to backend-specific details.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use vodcast_core::StorageTier;

/// Tier operation errors
#[derive(Debug, Error)]
pub enum TierError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Capability the backend cannot provide (e.g. presigned URLs on the
    /// local-disk tier).
    #[error("Unsupported by this tier: {0}")]
    Unsupported(String),

    #[error("Put failed: {0}")]
    PutFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Tier backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TierError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TierError::NotFound(_))
    }
}

/// Result type for tier operations
pub type TierResult<T> = Result<T, TierError>;

impl From<TierError> for vodcast_core::AppError {
    fn from(err: TierError) -> Self {
        use vodcast_core::AppError;
        match err {
            TierError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            TierError::Unsupported(msg) => AppError::Unsupported(msg),
            TierError::InvalidKey(key) => {
                AppError::InvalidInput(format!("Invalid storage key: {}", key))
            }
            other => AppError::Tier(other.to_string()),
        }
    }
}

/// Metadata returned by a `head` probe. Never carries the object body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size_bytes: u64,
}

/// Chunked byte stream yielded by a range read.
pub type ObjectByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TierError>> + Send>>;

/// One storage backend in the fallback hierarchy.
///
/// Implementations are stateless and safe for concurrent use by any number
/// of in-flight operations; the engine shares them via `Arc`.
#[async_trait]
pub trait ObjectTier: Send + Sync {
    /// Which tier this backend is (primary, secondary, local).
    fn id(&self) -> StorageTier;

    /// Whole-object write. Must never leave a partial object visible to
    /// readers on failure.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> TierResult<()>;

    /// Metadata-only probe; must not transfer the object body.
    /// Distinguishes `NotFound` from transport errors.
    async fn head(&self, key: &str) -> TierResult<ObjectInfo>;

    /// Partial read of `[start, end]`; `end` is inclusive.
    async fn get_range(&self, key: &str, start: u64, end: u64) -> TierResult<ObjectByteStream>;

    /// Idempotent delete; a missing key is not an error.
    async fn delete(&self, key: &str) -> TierResult<()>;

    /// Mint a time-boxed read-only URL bound to the exact key.
    ///
    /// Only cloud tiers can do this; the local tier returns
    /// `TierError::Unsupported`. Signing is stateless, so revocation before
    /// expiry is not possible.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> TierResult<String>;

    /// Remove every object under a key prefix (derived artifacts such as
    /// `hls/{video_id}/`). Idempotent like `delete`.
    async fn delete_prefix(&self, prefix: &str) -> TierResult<()>;
}
