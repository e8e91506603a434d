//! Storage error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<campus_core::Error> for StorageError {
    fn from(err: campus_core::Error) -> Self {
        StorageError::InvalidUpload(err.to_string())
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
