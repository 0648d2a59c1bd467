//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use vodcast_core::Config;
use vodcast_db::VideoCatalog;
use vodcast_delivery::{
    DeletionCoordinator, HlsPackager, RangeStreamer, Segmenter, SignedUrlIssuer,
    UploadCoordinator,
};
use vodcast_storage::TierSet;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn VideoCatalog>,
    pub uploader: UploadCoordinator,
    pub streamer: RangeStreamer,
    pub signer: SignedUrlIssuer,
    pub packager: HlsPackager,
    pub deleter: DeletionCoordinator,
}

impl AppState {
    /// Wire the engine components onto one tier set and catalog. The
    /// segmenter is injected so tests run without ffmpeg.
    pub fn new(
        config: Config,
        tiers: TierSet,
        catalog: Arc<dyn VideoCatalog>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Self {
        let probe_timeout = Duration::from_millis(config.head_probe_timeout_ms);
        Self {
            uploader: UploadCoordinator::new(tiers.clone(), catalog.clone()),
            streamer: RangeStreamer::new(
                tiers.clone(),
                catalog.clone(),
                probe_timeout,
                config.stream_buffer_bytes,
            ),
            signer: SignedUrlIssuer::new(
                tiers.clone(),
                catalog.clone(),
                probe_timeout,
                Duration::from_secs(config.signed_url_default_expiry_secs),
                Duration::from_secs(config.signed_url_max_expiry_secs),
            ),
            packager: HlsPackager::new(tiers.clone(), catalog.clone(), segmenter, probe_timeout),
            deleter: DeletionCoordinator::new(tiers, catalog.clone()),
            catalog,
            config,
        }
    }
}
