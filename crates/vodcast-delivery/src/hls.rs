//! HLS packaging pipeline.
//!
//! Packaging is forward-only: `none → processing → ready | failed`, recorded
//! in the catalog. The pipeline downloads the source to a scratch directory,
//! segments it (ffmpeg in production, injectable behind `Segmenter`), and
//! uploads the manifest plus segments under `hls/{video_id}/` on the highest
//! available tier. Failures mark the record `failed` and never touch the
//! source bytes; a later packaging run or deletion cleans up partial
//! artifacts. Re-running on a `ready` or `failed` record restarts from
//! `processing` and overwrites.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use vodcast_core::{AppError, HlsStatus, StorageTier, VideoRecord};
use vodcast_db::VideoCatalog;
use vodcast_storage::{keys, ObjectByteStream, ObjectTier, TierSet};

use crate::media_type::content_type_for;
use crate::resolve::resolve_source;

/// Turns a source video file into an HLS rendition on local disk.
#[async_trait]
pub trait Segmenter: Send + Sync {
    /// Write `playlist.m3u8` and its `.ts` segments into `output_dir`.
    async fn segment(&self, source: &Path, output_dir: &Path) -> anyhow::Result<()>;
}

/// Production segmenter: shells out to ffmpeg, copying codecs into a single
/// VOD rendition (no transcoding, no bitrate ladder).
pub struct FfmpegSegmenter {
    ffmpeg_path: String,
    segment_duration: u64,
}

impl FfmpegSegmenter {
    pub fn new(ffmpeg_path: impl Into<String>, segment_duration: u64) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            segment_duration,
        }
    }
}

#[async_trait]
impl Segmenter for FfmpegSegmenter {
    async fn segment(&self, source: &Path, output_dir: &Path) -> anyhow::Result<()> {
        let output = tokio::process::Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-c", "copy"])
            .args(["-hls_time", &self.segment_duration.to_string()])
            .args(["-hls_playlist_type", "vod"])
            .arg("-hls_segment_filename")
            .arg(output_dir.join("segment_%03d.ts"))
            .arg(output_dir.join(keys::HLS_PLAYLIST_NAME))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to spawn ffmpeg at {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            bail!("ffmpeg exited with {}: {}", output.status, tail);
        }
        Ok(())
    }
}

pub struct HlsPackager {
    tiers: TierSet,
    catalog: Arc<dyn VideoCatalog>,
    segmenter: Arc<dyn Segmenter>,
    probe_timeout: Duration,
}

impl HlsPackager {
    pub fn new(
        tiers: TierSet,
        catalog: Arc<dyn VideoCatalog>,
        segmenter: Arc<dyn Segmenter>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            tiers,
            catalog,
            segmenter,
            probe_timeout,
        }
    }

    /// Tier where artifacts are written and read back. The highest available
    /// tier, determined by the fixed fallback order, so writer and reader
    /// always agree under one configuration.
    fn artifact_tier(&self) -> Result<(StorageTier, &Arc<dyn ObjectTier>), AppError> {
        self.tiers
            .in_fallback_order()
            .next()
            .ok_or_else(|| AppError::Internal("No storage tier available".to_string()))
    }

    /// Package `video_id`, recording every outcome in the catalog. A pipeline
    /// failure is recorded as `failed` and is not an error to the caller;
    /// only catalog access failures propagate.
    pub async fn package(&self, video_id: Uuid) -> Result<HlsStatus, AppError> {
        let record = self
            .catalog
            .get(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video not found: {}", video_id)))?;

        self.catalog
            .set_hls_status(video_id, HlsStatus::Processing, None)
            .await?;

        match self.run_pipeline(&record).await {
            Ok(playlist_key) => {
                self.catalog
                    .set_hls_status(video_id, HlsStatus::Ready, Some(playlist_key))
                    .await?;
                tracing::info!(video_id = %video_id, "HLS packaging complete");
                Ok(HlsStatus::Ready)
            }
            Err(e) => {
                tracing::error!(video_id = %video_id, error = %format!("{:#}", e), "HLS packaging failed");
                self.catalog
                    .set_hls_status(video_id, HlsStatus::Failed, None)
                    .await?;
                Ok(HlsStatus::Failed)
            }
        }
    }

    async fn run_pipeline(&self, record: &VideoRecord) -> anyhow::Result<String> {
        let resolved = resolve_source(
            &self.tiers,
            self.catalog.as_ref(),
            record,
            self.probe_timeout,
        )
        .await
        .context("Failed to resolve source bytes")?;
        if resolved.size_bytes == 0 {
            bail!("Source object is empty");
        }

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let source_path = scratch.path().join(&record.original_filename);
        let upstream = resolved
            .backend
            .get_range(&resolved.key, 0, resolved.size_bytes - 1)
            .await
            .context("Failed to open source stream")?;
        write_stream_to_file(upstream, &source_path).await?;

        let output_dir = scratch.path().join("hls");
        tokio::fs::create_dir(&output_dir)
            .await
            .context("Failed to create segment output directory")?;
        self.segmenter
            .segment(&source_path, &output_dir)
            .await
            .context("Segmenting failed")?;

        self.upload_artifacts(record.id, &output_dir).await
    }

    /// Upload everything the segmenter produced; the manifest key is the
    /// return value. A missing manifest means the segmenter misbehaved.
    async fn upload_artifacts(&self, video_id: Uuid, output_dir: &Path) -> anyhow::Result<String> {
        let (tier, backend) = self.artifact_tier()?;
        let mut entries = tokio::fs::read_dir(output_dir)
            .await
            .context("Failed to list segment output")?;
        let mut manifest_key = None;
        let mut segment_count = 0usize;

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            let data = tokio::fs::read(entry.path())
                .await
                .with_context(|| format!("Failed to read artifact {}", filename))?;
            let key = keys::hls_key(video_id, &filename);
            backend
                .put(&key, Bytes::from(data), content_type_for(&filename))
                .await
                .with_context(|| format!("Failed to upload artifact {}", key))?;
            if filename == keys::HLS_PLAYLIST_NAME {
                manifest_key = Some(key);
            } else {
                segment_count += 1;
            }
        }

        let Some(manifest_key) = manifest_key else {
            bail!("Segmenter produced no {}", keys::HLS_PLAYLIST_NAME);
        };
        tracing::info!(
            video_id = %video_id,
            tier = %tier,
            segment_count,
            "HLS artifacts uploaded"
        );
        Ok(manifest_key)
    }

    /// Open one packaged artifact (manifest or segment) for streaming.
    /// Artifacts are only served once the record is `ready`.
    pub async fn open_artifact(
        &self,
        record: &VideoRecord,
        filename: &str,
    ) -> Result<HlsArtifact, AppError> {
        if !record.is_hls_ready() {
            return Err(AppError::NotFound(format!(
                "Video has no HLS rendition: {}",
                record.id
            )));
        }
        let (_, backend) = self.artifact_tier()?;
        let key = keys::hls_key(record.id, filename);
        let info = backend.head(&key).await?;
        let stream = if info.size_bytes == 0 {
            Box::pin(futures::stream::empty()) as ObjectByteStream
        } else {
            backend.get_range(&key, 0, info.size_bytes - 1).await?
        };
        Ok(HlsArtifact {
            stream,
            content_length: info.size_bytes,
            content_type: content_type_for(filename),
        })
    }
}

pub struct HlsArtifact {
    pub stream: ObjectByteStream,
    pub content_length: u64,
    pub content_type: &'static str,
}

impl std::fmt::Debug for HlsArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HlsArtifact")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

async fn write_stream_to_file(mut stream: ObjectByteStream, path: &Path) -> anyhow::Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .context("Failed to create scratch source file")?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Source read failed")?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}
