//! Validation errors raised before anything touches storage or the database.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} is empty")]
    EmptyFile(String),

    #[error("{file} is {size} bytes, limit is {max}")]
    TooLarge { file: String, size: usize, max: usize },

    #[error("{file} has content type {content_type}, expected an image")]
    NotAnImage { file: String, content_type: String },

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("malformed id {0:?}")]
    MalformedId(String),
}

pub type Result<T> = std::result::Result<T, Error>;
