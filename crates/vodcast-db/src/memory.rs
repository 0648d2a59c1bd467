//! In-memory catalog for tests and single-node deployments without Postgres.

use crate::catalog::VideoCatalog;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vodcast_core::{AppError, HlsStatus, StorageTier, VideoRecord};

#[derive(Clone, Default)]
pub struct InMemoryVideoCatalog {
    records: Arc<RwLock<HashMap<Uuid, VideoRecord>>>,
}

impl InMemoryVideoCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoCatalog for InMemoryVideoCatalog {
    async fn insert(&self, record: &VideoRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(AppError::InvalidInput(format!(
                "Video {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<VideoRecord>, AppError> {
        let records = self.records.read().await;
        let mut all: Vec<VideoRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn update_storage_tier(&self, id: Uuid, tier: StorageTier) -> Result<(), AppError> {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.storage_tier = Some(tier);
        }
        Ok(())
    }

    async fn update_file_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError> {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.file_size_bytes = Some(size_bytes);
        }
        Ok(())
    }

    async fn set_hls_status(
        &self,
        id: Uuid,
        status: HlsStatus,
        playlist_key: Option<String>,
    ) -> Result<(), AppError> {
        if let Some(record) = self.records.write().await.get_mut(&id) {
            record.hls_status = status;
            record.hls_playlist_key = playlist_key;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}
