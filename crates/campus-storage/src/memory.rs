//! In-memory object store for tests and local development.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::{ObjectStore, StorageError, StorageResult, StoredObject};

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    /// Keys whose writes are rejected, to exercise failure paths.
    failing_puts: RwLock<HashSet<String>>,
    failing_deletes: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Make every `put` whose key contains `fragment` fail.
    pub async fn fail_puts_matching(&self, fragment: &str) {
        self.failing_puts.write().await.insert(fragment.to_string());
    }

    /// Make every `delete` whose key contains `fragment` fail.
    pub async fn fail_deletes_matching(&self, fragment: &str) {
        self.failing_deletes
            .write()
            .await
            .insert(fragment.to_string());
    }

    async fn rejects(set: &RwLock<HashSet<String>>, key: &str) -> bool {
        set.read().await.iter().any(|f| key.contains(f.as_str()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        if Self::rejects(&self.failing_puts, key).await {
            return Err(StorageError::Backend(format!("put rejected for {}", key)));
        }
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if Self::rejects(&self.failing_deletes, key).await {
            return Err(StorageError::Backend(format!("delete rejected for {}", key)));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<StoredObject>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store
            .put("news/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert!(store.exists("news/a.png").await.unwrap());
        assert_eq!(store.get("news/a.png").await.unwrap().unwrap().content_type, "image/png");

        store.delete("news/a.png").await.unwrap();
        assert!(!store.exists("news/a.png").await.unwrap());
        // Deleting again is fine.
        store.delete("news/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        store.fail_puts_matching("broken").await;
        let result = store
            .put("news/broken.png", Bytes::from_static(b"x"), "image/png")
            .await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert!(store.is_empty().await);
    }
}
