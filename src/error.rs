//! Error types for measurement storage and indexing.

use thiserror::Error;

/// Broad failure categories, used by the CLI to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or non-2xx response from the row store (1)
    Transport = 1,
    /// Response body could not be decoded into records (2)
    Decode = 2,
    /// Missing or invalid configuration (3)
    Config = 3,
    /// Record id not present in the index (4)
    NotFound = 4,
    /// A field carried a value outside its allowed set (5)
    InvalidField = 5,
    /// Local filesystem failure (6)
    Io = 6,
}

/// Main error type for the measurement library.
#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode row data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Missing required setting '{name}'")]
    MissingSetting { name: String },

    #[error("Invalid value for setting '{name}': {value}")]
    InvalidSetting { name: String, value: String },

    #[error("Measurement {id} not found")]
    RecordNotFound { id: u64 },

    #[error("Invalid value for '{field}': '{value}'")]
    InvalidField { field: String, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeasureError {
    /// Get the category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeasureError::Http(_) => ErrorKind::Transport,
            MeasureError::Api { .. } => ErrorKind::Transport,
            MeasureError::Decode(_) => ErrorKind::Decode,
            MeasureError::MissingSetting { .. } => ErrorKind::Config,
            MeasureError::InvalidSetting { .. } => ErrorKind::Config,
            MeasureError::RecordNotFound { .. } => ErrorKind::NotFound,
            MeasureError::InvalidField { .. } => ErrorKind::InvalidField,
            MeasureError::Validation(_) => ErrorKind::InvalidField,
            MeasureError::Io(_) => ErrorKind::Io,
        }
    }

    /// Get the numeric code for this error.
    pub fn code_value(&self) -> i32 {
        self.kind() as i32
    }
}

/// Result type alias for measurement operations.
pub type Result<T> = std::result::Result<T, MeasureError>;
