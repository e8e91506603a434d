//! Crawler error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid start url: {0}")]
    InvalidStartUrl(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("index error: {0}")]
    Index(#[from] campus_db::DbError),
}

pub type CrawlResult<T> = std::result::Result<T, CrawlError>;
