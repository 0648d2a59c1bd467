//! Vodcast delivery engine
//!
//! The storage and delivery core: whole-file ingest through the tier
//! fallback chain, HTTP byte-range playback with backpressure and
//! cancellation, time-limited signed URLs, HLS packaging, and best-effort
//! deletion. Everything here works against the `ObjectTier` and
//! `VideoCatalog` abstractions; no backend specifics leak in.

pub mod delete;
pub mod hls;
pub mod media_type;
pub mod range;
pub mod resolve;
pub mod signer;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub use delete::DeletionCoordinator;
pub use hls::{FfmpegSegmenter, HlsArtifact, HlsPackager, Segmenter};
pub use range::{PlaybackStatus, PlaybackStream, RangeStreamer};
pub use signer::{SignedUrl, SignedUrlIssuer};
pub use upload::{UploadCoordinator, UploadRequest, UploadSource};
