use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Storage tier where a video's bytes currently reside.
///
/// Tiers form a fixed fallback hierarchy (primary cloud store, secondary
/// cloud store, local disk). Exactly one tier is authoritative for a video
/// at any time; tiers are alternatives, not replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "storage_tier", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    Primary,
    Secondary,
    Local,
}

impl StorageTier {
    /// Fixed attempt order for uploads and legacy tier discovery.
    /// Encodes the durability preference: cloud-primary, cloud-secondary,
    /// disk-last-resort. Not configurable per call.
    pub const FALLBACK_ORDER: [StorageTier; 3] =
        [StorageTier::Primary, StorageTier::Secondary, StorageTier::Local];
}

impl FromStr for StorageTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(StorageTier::Primary),
            "secondary" => Ok(StorageTier::Secondary),
            "local" => Ok(StorageTier::Local),
            _ => Err(anyhow::anyhow!("Invalid storage tier: {}", s)),
        }
    }
}

impl Display for StorageTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageTier::Primary => write!(f, "primary"),
            StorageTier::Secondary => write!(f, "secondary"),
            StorageTier::Local => write!(f, "local"),
        }
    }
}

/// HLS packaging state for a video.
///
/// Moves forward only: `none → processing → ready | failed`. Re-running
/// packaging on a `ready` or `failed` video restarts from `processing`.
/// A failed attempt never deletes the original video bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "hls_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum HlsStatus {
    None,
    Processing,
    Ready,
    Failed,
}

impl Display for HlsStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            HlsStatus::None => write!(f, "none"),
            HlsStatus::Processing => write!(f, "processing"),
            HlsStatus::Ready => write!(f, "ready"),
            HlsStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Metadata record for one uploaded video asset.
///
/// The engine owns the storage bookkeeping fields (`storage_tier`,
/// `file_size_bytes`, `hls_status`, `hls_playlist_key`); the surrounding
/// application only reads the record to render UI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoRecord {
    pub id: Uuid,
    /// Attribution only; not enforced by the engine.
    pub owner_id: Option<Uuid>,
    pub original_filename: String,
    pub title: String,
    /// Supplied by the caller at upload time, never computed here.
    pub duration_seconds: Option<f64>,
    /// Nullable until first successfully measured; lazily backfilled from a
    /// `head` probe when missing.
    pub file_size_bytes: Option<i64>,
    /// Tier where the bytes currently reside. `None` only for records
    /// created before tier tracking existed; playback resolution discovers
    /// and persists the tier for those.
    pub storage_tier: Option<StorageTier>,
    pub hls_status: HlsStatus,
    /// Set only when `hls_status` is `ready`.
    pub hls_playlist_key: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Derive a title from the original filename (stem without extension),
    /// used when the caller supplies none.
    pub fn title_from_filename(filename: &str) -> String {
        let stem = filename.rsplit('/').next().unwrap_or(filename);
        match stem.rsplit_once('.') {
            Some((name, _ext)) if !name.is_empty() => name.to_string(),
            _ => stem.to_string(),
        }
    }

    pub fn is_hls_ready(&self) -> bool {
        self.hls_status == HlsStatus::Ready && self.hls_playlist_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_tier_round_trip() {
        for tier in StorageTier::FALLBACK_ORDER {
            let parsed: StorageTier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
        assert!("nfs".parse::<StorageTier>().is_err());
    }

    #[test]
    fn test_fallback_order_is_cloud_first() {
        assert_eq!(
            StorageTier::FALLBACK_ORDER,
            [StorageTier::Primary, StorageTier::Secondary, StorageTier::Local]
        );
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(VideoRecord::title_from_filename("intro.mp4"), "intro");
        assert_eq!(
            VideoRecord::title_from_filename("webinar session 3.final.mov"),
            "webinar session 3.final"
        );
        assert_eq!(VideoRecord::title_from_filename("noext"), "noext");
        assert_eq!(VideoRecord::title_from_filename(".hidden"), ".hidden");
    }

    #[test]
    fn test_hls_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&HlsStatus::Processing).unwrap(),
            "\"processing\""
        );
        let status: HlsStatus = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(status, HlsStatus::Ready);
    }
}
