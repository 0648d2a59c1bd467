//! Ordered tier registry.
//!
//! `TierSet` holds the configured backends and exposes the fixed fallback
//! order (primary → secondary → local). The order encodes the durability
//! preference and is not configurable per call.

use crate::traits::{ObjectTier, TierError, TierResult};
use std::sync::Arc;
#[cfg(all(feature = "tier-s3", feature = "tier-local"))]
use vodcast_core::Config;
use vodcast_core::StorageTier;

#[derive(Clone)]
pub struct TierSet {
    primary: Option<Arc<dyn ObjectTier>>,
    secondary: Option<Arc<dyn ObjectTier>>,
    local: Arc<dyn ObjectTier>,
}

impl TierSet {
    /// Assemble a tier set from already-constructed backends. The local tier
    /// is mandatory; cloud tiers are `None` when unconfigured.
    pub fn new(
        primary: Option<Arc<dyn ObjectTier>>,
        secondary: Option<Arc<dyn ObjectTier>>,
        local: Arc<dyn ObjectTier>,
    ) -> Self {
        Self {
            primary,
            secondary,
            local,
        }
    }

    /// Build the tier set from configuration: S3 clients for the cloud tiers
    /// that are configured, plus the always-present local tier.
    #[cfg(all(feature = "tier-s3", feature = "tier-local"))]
    pub async fn from_config(config: &Config) -> TierResult<Self> {
        let primary = match &config.primary_tier {
            Some(cfg) => Some(Arc::new(
                crate::S3Tier::new(StorageTier::Primary, cfg).await?,
            ) as Arc<dyn ObjectTier>),
            None => None,
        };

        let secondary = match &config.secondary_tier {
            Some(cfg) => Some(Arc::new(
                crate::S3Tier::new(StorageTier::Secondary, cfg).await?,
            ) as Arc<dyn ObjectTier>),
            None => None,
        };

        let local: Arc<dyn ObjectTier> =
            Arc::new(crate::LocalDiskTier::new(&config.local_storage_path).await?);

        tracing::info!(
            primary_available = primary.is_some(),
            secondary_available = secondary.is_some(),
            local_path = %config.local_storage_path,
            "Storage tiers initialized"
        );

        Ok(Self::new(primary, secondary, local))
    }

    /// Backend for a specific tier, if available.
    pub fn get(&self, tier: StorageTier) -> Option<&Arc<dyn ObjectTier>> {
        match tier {
            StorageTier::Primary => self.primary.as_ref(),
            StorageTier::Secondary => self.secondary.as_ref(),
            StorageTier::Local => Some(&self.local),
        }
    }

    /// Backend for a tier, or a `Backend` error naming the unavailable tier.
    pub fn require(&self, tier: StorageTier) -> TierResult<&Arc<dyn ObjectTier>> {
        self.get(tier)
            .ok_or_else(|| TierError::Backend(format!("{} tier is not configured", tier)))
    }

    pub fn local(&self) -> &Arc<dyn ObjectTier> {
        &self.local
    }

    /// Available backends in the fixed fallback order, labelled by the slot
    /// they occupy. The slot label is what gets recorded as a video's
    /// `storage_tier`; a backend's own `id()` is only used for logging.
    pub fn in_fallback_order(&self) -> impl Iterator<Item = (StorageTier, &Arc<dyn ObjectTier>)> {
        StorageTier::FALLBACK_ORDER
            .iter()
            .filter_map(|tier| self.get(*tier).map(|backend| (*tier, backend)))
    }
}
