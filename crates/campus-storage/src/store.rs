//! Object storage abstraction.

use async_trait::async_trait;
use bytes::Bytes;

use crate::StorageResult;

/// An object's bytes with the content type it was stored under.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Trait for media storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Store an object, replacing any previous one under the same key.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Fetch an object, or `None` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
