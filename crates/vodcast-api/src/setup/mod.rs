//! Application wiring: catalog and tier construction, router assembly.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use vodcast_core::Config;
use vodcast_db::{InMemoryVideoCatalog, PgVideoCatalog, VideoCatalog};
use vodcast_delivery::FfmpegSegmenter;
use vodcast_storage::TierSet;

use crate::state::AppState;

/// Build the catalog, tier set, and engine components from configuration.
pub async fn initialize_app(config: Config) -> anyhow::Result<(Arc<AppState>, Router)> {
    let catalog: Arc<dyn VideoCatalog> = match &config.database_url {
        Some(url) => {
            let catalog = PgVideoCatalog::connect(url)
                .await
                .context("Failed to connect to Postgres catalog")?;
            tracing::info!("Using Postgres catalog");
            Arc::new(catalog)
        }
        None => {
            tracing::info!("No DATABASE_URL set, using in-memory catalog");
            Arc::new(InMemoryVideoCatalog::new())
        }
    };

    let tiers = TierSet::from_config(&config)
        .await
        .context("Failed to initialize storage tiers")?;

    let segmenter = Arc::new(FfmpegSegmenter::new(
        config.ffmpeg_path.clone(),
        config.hls_segment_duration,
    ));

    let state = Arc::new(AppState::new(config, tiers, catalog, segmenter));
    let router = routes::build_router(state.clone());
    Ok((state, router))
}
