//! Error types for project state

use thiserror::Error;
use wd_file::FileError;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Invalid station id: {0:?}")]
    InvalidStationId(String),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StateResult<T> = Result<T, StateError>;
