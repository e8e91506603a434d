//! Errors raised while reading or checking `campus.kdl`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid KDL: {0}")]
    Syntax(#[from] kdl::KdlError),

    #[error("`{0}` is required")]
    Missing(String),

    #[error("`{setting}`: {reason}")]
    Invalid { setting: String, reason: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
