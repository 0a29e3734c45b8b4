//! Error types for fieldops.

use thiserror::Error;

/// Errors that can occur outside the network layer.
#[derive(Error, Debug)]
pub enum FieldOpsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD, DD/MM/YYYY, today, tomorrow or yesterday")]
    InvalidDate(String),

    #[error("Unknown category '{0}'. Expected one of: construction, splicing, earthwork, autopsy")]
    UnknownCategory(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for fieldops operations.
pub type FieldOpsResult<T> = Result<T, FieldOpsError>;
