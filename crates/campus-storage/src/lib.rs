//! Media object storage for the Campus site.
//!
//! This crate contains:
//! - The `ObjectStore` trait and its S3 and in-memory backends
//! - Multi-file uploads with best-effort rollback on failure

pub mod error;
pub mod memory;
pub mod s3;
pub mod store;
pub mod upload;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use s3::S3Store;
pub use store::{ObjectStore, StoredObject};
pub use upload::{MediaLibrary, MediaUpload, StoredMedia, discard};

use std::sync::Arc;

use campus_config::StorageSettings;

/// Build the store selected by configuration.
pub async fn from_settings(settings: &StorageSettings) -> StorageResult<Arc<dyn ObjectStore>> {
    match settings.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "s3" => Ok(Arc::new(S3Store::from_settings(settings).await)),
        other => Err(StorageError::Backend(format!(
            "unknown storage backend: {}",
            other
        ))),
    }
}
