use crate::catalog::VideoCatalog;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vodcast_core::{AppError, HlsStatus, StorageTier, VideoRecord};

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    original_filename: String,
    title: String,
    duration_seconds: Option<f64>,
    file_size_bytes: Option<i64>,
    storage_tier: Option<StorageTier>,
    hls_status: HlsStatus,
    hls_playlist_key: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            id: row.id,
            owner_id: row.owner_id,
            original_filename: row.original_filename,
            title: row.title,
            duration_seconds: row.duration_seconds,
            file_size_bytes: row.file_size_bytes,
            storage_tier: row.storage_tier,
            hls_status: row.hls_status,
            hls_playlist_key: row.hls_playlist_key,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Postgres-backed catalog.
#[derive(Clone)]
pub struct PgVideoCatalog {
    pool: PgPool,
}

impl PgVideoCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(AppError::from)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl VideoCatalog for PgVideoCatalog {
    #[tracing::instrument(skip(self, record), fields(db.table = "videos", db.operation = "insert", db.record_id = %record.id))]
    async fn insert(&self, record: &VideoRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos
                (id, owner_id, original_filename, title, duration_seconds,
                 file_size_bytes, storage_tier, hls_status, hls_playlist_key, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.original_filename)
        .bind(&record.title)
        .bind(record.duration_seconds)
        .bind(record.file_size_bytes)
        .bind(record.storage_tier)
        .bind(record.hls_status)
        .bind(&record.hls_playlist_key)
        .bind(record.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT * FROM videos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VideoRecord::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<VideoRecord>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT * FROM videos ORDER BY uploaded_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VideoRecord::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn update_storage_tier(&self, id: Uuid, tier: StorageTier) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET storage_tier = $2 WHERE id = $1")
            .bind(id)
            .bind(tier)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn update_file_size(&self, id: Uuid, size_bytes: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET file_size_bytes = $2 WHERE id = $1")
            .bind(id)
            .bind(size_bytes)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_hls_status(
        &self,
        id: Uuid,
        status: HlsStatus,
        playlist_key: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET hls_status = $2, hls_playlist_key = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(playlist_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
