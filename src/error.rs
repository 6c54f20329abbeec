//! Error types for schema tracking

use thiserror::Error;

/// Result type for drift-tracking operations
pub type Result<T> = std::result::Result<T, DriftError>;

/// Schema tracking errors
#[derive(Error, Debug)]
pub enum DriftError {
    #[error("unsupported source type: {0}")]
    UnsupportedType(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("unknown field type: {0}")]
    UnknownFieldType(String),

    #[error("malformed field: {0}")]
    MalformedField(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
