//! Vodcast Core Library
//!
//! Domain models, error types, and configuration shared across all
//! vodcast components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{HlsStatus, StorageTier, VideoRecord};
