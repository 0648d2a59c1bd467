//! Vodcast Storage Library
//!
//! The `ObjectTier` abstraction and its backends: two S3-compatible cloud
//! tiers (primary, secondary) and a local-disk last resort. All tiers offer
//! the same put/head/range-get/delete capability over a namespaced key.
//!
//! # Key format
//!
//! All backends use the same key layout:
//!
//! - **Source bytes**: `videos/{video_id}/{filename}`
//! - **HLS artifacts**: `hls/{video_id}/{filename}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is
//! centralized in the `keys` module so all backends stay consistent.

pub mod keys;
#[cfg(feature = "tier-local")]
pub mod local;
#[cfg(feature = "tier-s3")]
pub mod s3;
pub mod tiers;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "tier-local")]
pub use local::LocalDiskTier;
#[cfg(feature = "tier-s3")]
pub use s3::S3Tier;
pub use tiers::TierSet;
pub use traits::{ObjectByteStream, ObjectInfo, ObjectTier, TierError, TierResult};
pub use vodcast_core::StorageTier;
