//! File I/O error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Encode error: {0}")]
    EncodeError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl FileError {
    /// True for errors caused by the file's contents rather than the filesystem
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            FileError::UnsupportedFormat(_) | FileError::InvalidFile(_)
        )
    }
}

pub type FileResult<T> = Result<T, FileError>;
