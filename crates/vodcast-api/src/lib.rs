//! Vodcast HTTP API
//!
//! axum surface over the delivery engine: multipart upload, byte-range
//! playback, signed URLs, HLS packaging and retrieval, deletion, and the
//! metadata read endpoints.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
