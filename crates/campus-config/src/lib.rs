//! KDL configuration parsing for the Campus site.
//!
//! This crate handles:
//! - Site configuration (`campus.kdl`)
//! - Environment overrides for deployment secrets and endpoints

pub mod error;
mod kdl_ext;
pub mod site;

pub use error::{ConfigError, ConfigResult};
pub use site::{
    CrawlerSettings, DatabaseSettings, ServerSettings, SiteConfig, StorageSettings,
    parse_site_config,
};
