use async_trait::async_trait;
use uuid::Uuid;
use vodcast_core::{AppError, HlsStatus, StorageTier, VideoRecord};

/// Metadata record store, keyed by video id.
///
/// Implementations must be safe for concurrent use; the engine shares one
/// catalog across all in-flight operations.
#[async_trait]
pub trait VideoCatalog: Send + Sync {
    /// Insert a freshly uploaded record. Fails if the id already exists.
    async fn insert(&self, record: &VideoRecord) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Newest-first page of records (for the metadata-read boundary).
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<VideoRecord>, AppError>;

    /// Record which tier now holds the bytes (legacy tier discovery).
    async fn update_storage_tier(&self, id: Uuid, tier: StorageTier) -> Result<(), AppError>;

    /// Lazily backfill a measured object size.
    async fn update_file_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError>;

    /// Advance the HLS state machine; `playlist_key` accompanies `ready`.
    async fn set_hls_status(
        &self,
        id: Uuid,
        status: HlsStatus,
        playlist_key: Option<String>,
    ) -> Result<(), AppError>;

    /// Remove the record. Returns whether a record existed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
