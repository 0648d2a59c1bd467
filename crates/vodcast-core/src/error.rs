//! Error types module
//!
//! All engine errors are unified under the `AppError` enum, which can
//! represent catalog, tier, range, and validation failures. The `Database`
//! variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid ranges or missing videos
    Debug,
    /// Warning level - for recoverable issues like single-tier failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g. "RANGE_NOT_SATISFIABLE")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    /// Transient failure on a single storage tier. Absorbed by the upload
    /// fallback; surfaced only when playback resolution fails.
    #[error("Storage tier error: {0}")]
    Tier(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Range not satisfiable: start {start} >= total size {total_size}")]
    RangeNotSatisfiable { start: u64, total_size: u64 },

    /// Capability not available for the video's tier (e.g. signed URLs for
    /// locally stored videos).
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    /// Every tier rejected the upload. Fatal; no record is created.
    #[error("All storage tiers exhausted: {0}")]
    Exhausted(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => 500,
            AppError::Tier(_) => 502,
            AppError::NotFound(_) => 404,
            AppError::RangeNotSatisfiable { .. } => 416,
            AppError::Unsupported(_) => 400,
            AppError::InvalidInput(_) => 400,
            AppError::PayloadTooLarge(_) => 413,
            AppError::Exhausted(_) => 502,
            AppError::Internal(_) | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Tier(_) => "TIER_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::RangeNotSatisfiable { .. } => "RANGE_NOT_SATISFIABLE",
            AppError::Unsupported(_) => "UNSUPPORTED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Exhausted(_) => "STORAGE_EXHAUSTED",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn client_message(&self) -> String {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => "A database error occurred".to_string(),
            AppError::Tier(_) => "Storage backend unavailable".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::NotFound(_)
            | AppError::RangeNotSatisfiable { .. }
            | AppError::Unsupported(_)
            | AppError::InvalidInput(_) => LogLevel::Debug,
            AppError::PayloadTooLarge(_) | AppError::Tier(_) => LogLevel::Warn,
            #[cfg(feature = "sqlx")]
            AppError::Database(_) => LogLevel::Error,
            AppError::Exhausted(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}
