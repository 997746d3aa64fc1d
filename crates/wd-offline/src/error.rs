//! Error types for offline rendering

use thiserror::Error;
use wd_file::FileError;

/// Offline render errors
#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Format error: {0}")]
    Format(FileError),

    #[error("Failed to write output file: {0}")]
    WriteError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid render request: {0}")]
    InvalidRequest(String),

    #[error("Segment not found: {0}")]
    SegmentNotFound(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Channel mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Upload queue error: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FileError> for OfflineError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound(path) => OfflineError::InputNotFound(path),
            FileError::Io(e) => OfflineError::Io(e),
            FileError::JsonError(e) => OfflineError::Json(e),
            FileError::EncodeError(msg) => OfflineError::WriteError(msg),
            other => OfflineError::Format(other),
        }
    }
}

/// Result type for offline operations
pub type OfflineResult<T> = Result<T, OfflineError>;
