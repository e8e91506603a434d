//! Multi-file uploads with best-effort rollback.
//!
//! A handler uploads every file, then writes the matching rows. When either
//! step fails, the objects that already reached storage are deleted again.
//! Cleanup is a single concurrent pass: failures are logged and left as
//! orphaned objects, never retried.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use campus_core::media::{cdn_url, object_key, validate_upload};
use campus_core::{MediaKind, ResourceId};
use futures::future::join_all;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::{ObjectStore, StorageError, StorageResult};

/// A file received from the admin API.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// An object that was written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    pub key: String,
    pub url: String,
    pub size: usize,
    /// SHA-256 of the content, hex encoded.
    pub checksum: String,
}

struct Prepared {
    key: String,
    content_type: String,
    data: Bytes,
}

/// Uploads media under the site's key layout and CDN base.
#[derive(Clone)]
pub struct MediaLibrary {
    store: Arc<dyn ObjectStore>,
    cdn_base: String,
    max_bytes: usize,
}

impl MediaLibrary {
    pub fn new(store: Arc<dyn ObjectStore>, cdn_base: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            store,
            cdn_base: cdn_base.into(),
            max_bytes,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn cdn_base(&self) -> &str {
        &self.cdn_base
    }

    /// Largest accepted file, in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate and upload every file concurrently.
    ///
    /// Nothing is written when any file fails validation. When any upload
    /// fails, the ones that succeeded are deleted and the first error is
    /// returned.
    pub async fn upload_all(
        &self,
        kind: MediaKind,
        owner: ResourceId,
        uploads: Vec<MediaUpload>,
    ) -> StorageResult<Vec<StoredMedia>> {
        if uploads.is_empty() {
            return Err(StorageError::InvalidUpload("no files to upload".to_string()));
        }

        let mut prepared = Vec::with_capacity(uploads.len());
        for upload in uploads {
            validate_upload(
                &upload.file_name,
                &upload.content_type,
                upload.data.len(),
                self.max_bytes,
            )?;
            prepared.push(Prepared {
                key: object_key(kind, owner, &upload.file_name)?,
                content_type: upload.content_type,
                data: upload.data,
            });
        }

        let results = join_all(
            prepared
                .iter()
                .map(|p| self.store.put(&p.key, p.data.clone(), &p.content_type)),
        )
        .await;

        let mut stored = Vec::with_capacity(prepared.len());
        let mut first_error = None;
        for (item, result) in prepared.into_iter().zip(results) {
            match result {
                Ok(()) => stored.push(StoredMedia {
                    url: cdn_url(&self.cdn_base, &item.key),
                    size: item.data.len(),
                    checksum: hex::encode(Sha256::digest(&item.data)),
                    key: item.key,
                }),
                Err(e) => {
                    warn!(key = %item.key, error = %e, "Upload failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(err) = first_error {
            let keys: Vec<String> = stored.into_iter().map(|s| s.key).collect();
            discard(self.store.as_ref(), &keys).await;
            return Err(err);
        }

        info!(
            backend = self.store.name(),
            kind = kind.prefix(),
            %owner,
            count = stored.len(),
            "Uploaded media"
        );
        Ok(stored)
    }

    /// Upload, then run `commit` (usually the row inserts).
    ///
    /// If `commit` fails every uploaded object is discarded and the commit
    /// error is returned unchanged.
    pub async fn upload_and_commit<T, E, F, Fut>(
        &self,
        kind: MediaKind,
        owner: ResourceId,
        uploads: Vec<MediaUpload>,
        commit: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Vec<StoredMedia>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StorageError> + Display,
    {
        let stored = self.upload_all(kind, owner, uploads).await?;
        let keys: Vec<String> = stored.iter().map(|s| s.key.clone()).collect();

        match commit(stored).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, count = keys.len(), "Commit failed, discarding uploads");
                discard(self.store.as_ref(), &keys).await;
                Err(err)
            }
        }
    }

    /// Swap a single object: upload the new one, commit, then drop the old key.
    ///
    /// The previous object is only deleted once the commit succeeded.
    pub async fn replace_and_commit<T, E, F, Fut>(
        &self,
        kind: MediaKind,
        owner: ResourceId,
        upload: MediaUpload,
        previous_key: Option<String>,
        commit: F,
    ) -> Result<T, E>
    where
        F: FnOnce(StoredMedia) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StorageError> + Display,
    {
        let value = self
            .upload_and_commit(kind, owner, vec![upload], |mut stored| async move {
                match stored.pop() {
                    Some(media) => commit(media).await,
                    None => Err(E::from(StorageError::Backend(
                        "upload returned no object".to_string(),
                    ))),
                }
            })
            .await?;

        if let Some(key) = previous_key {
            discard(self.store.as_ref(), &[key]).await;
        }
        Ok(value)
    }

    /// Best-effort delete of objects whose rows are already gone.
    pub async fn discard(&self, keys: &[String]) -> usize {
        discard(self.store.as_ref(), keys).await
    }
}

/// Delete `keys` concurrently, logging failures. Returns how many failed.
pub async fn discard(store: &dyn ObjectStore, keys: &[String]) -> usize {
    if keys.is_empty() {
        return 0;
    }

    let results = join_all(keys.iter().map(|key| store.delete(key))).await;
    let mut failures = 0;
    for (key, result) in keys.iter().zip(results) {
        if let Err(e) = result {
            failures += 1;
            warn!(key = %key, error = %e, "Failed to delete object, leaving it orphaned");
        }
    }
    if failures == 0 {
        info!(count = keys.len(), "Discarded objects");
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn png(name: &str) -> MediaUpload {
        MediaUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(format!("png-bytes-{}", name)),
        }
    }

    fn library(store: Arc<MemoryStore>) -> MediaLibrary {
        MediaLibrary::new(store, "https://cdn.example.edu", 1024)
    }

    #[tokio::test]
    async fn test_upload_all_stores_every_file() {
        let store = Arc::new(MemoryStore::new());
        let media = library(store.clone());
        let owner = ResourceId::new();

        let stored = media
            .upload_all(MediaKind::Facility, owner, vec![png("a.png"), png("b.PNG")])
            .await
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(store.len().await, 2);
        for item in &stored {
            assert!(item.key.starts_with(&format!("facilities/{}/", owner)));
            assert_eq!(item.url, format!("https://cdn.example.edu/{}", item.key));
            assert_eq!(item.checksum.len(), 64);
            assert!(store.exists(&item.key).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_invalid_file_uploads_nothing() {
        let store = Arc::new(MemoryStore::new());
        let media = library(store.clone());

        let mut bad = png("c.png");
        bad.content_type = "text/plain".to_string();
        let result = media
            .upload_all(MediaKind::News, ResourceId::new(), vec![png("a.png"), bad])
            .await;

        assert!(matches!(result, Err(StorageError::InvalidUpload(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let media = library(Arc::new(MemoryStore::new()));
        let result = media
            .upload_all(MediaKind::News, ResourceId::new(), Vec::new())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidUpload(_))));
    }

    #[tokio::test]
    async fn test_partial_upload_failure_rolls_back() {
        let store = Arc::new(MemoryStore::new());
        store.fail_puts_matching(".gif").await;
        let media = library(store.clone());

        let gif = MediaUpload {
            file_name: "anim.gif".to_string(),
            content_type: "image/gif".to_string(),
            data: Bytes::from_static(b"gif"),
        };
        let result = media
            .upload_all(
                MediaKind::News,
                ResourceId::new(),
                vec![png("a.png"), gif, png("b.png")],
            )
            .await;

        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert!(store.is_empty().await, "successful uploads must be removed");
    }

    #[tokio::test]
    async fn test_commit_failure_discards_uploads() {
        let store = Arc::new(MemoryStore::new());
        let media = library(store.clone());

        let result: Result<(), StorageError> = media
            .upload_and_commit(
                MediaKind::Facility,
                ResourceId::new(),
                vec![png("a.png"), png("b.png")],
                |stored| async move {
                    assert_eq!(stored.len(), 2);
                    Err(StorageError::Backend("insert failed".to_string()))
                },
            )
            .await;

        assert!(matches!(result, Err(StorageError::Backend(msg)) if msg == "insert failed"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_success_keeps_uploads() {
        let store = Arc::new(MemoryStore::new());
        let media = library(store.clone());

        let keys = media
            .upload_and_commit(
                MediaKind::News,
                ResourceId::new(),
                vec![png("a.png")],
                |stored| async move {
                    Ok::<_, StorageError>(stored.into_iter().map(|s| s.key).collect::<Vec<_>>())
                },
            )
            .await
            .unwrap();

        assert_eq!(store.keys().await, keys);
    }

    #[tokio::test]
    async fn test_replace_deletes_previous_only_after_commit() {
        let store = Arc::new(MemoryStore::new());
        let media = library(store.clone());
        let owner = ResourceId::new();

        let first = media
            .upload_all(MediaKind::Banner, owner, vec![png("old.png")])
            .await
            .unwrap()
            .remove(0);

        // Failed commit keeps the old object and removes the new one.
        let failed: Result<StoredMedia, StorageError> = media
            .replace_and_commit(
                MediaKind::Banner,
                owner,
                png("new.png"),
                Some(first.key.clone()),
                |_| async { Err(StorageError::Backend("update failed".to_string())) },
            )
            .await;
        assert!(failed.is_err());
        assert_eq!(store.keys().await, vec![first.key.clone()]);

        let replaced = media
            .replace_and_commit(
                MediaKind::Banner,
                owner,
                png("new.png"),
                Some(first.key.clone()),
                |stored| async move { Ok::<_, StorageError>(stored) },
            )
            .await
            .unwrap();
        assert_eq!(store.keys().await, vec![replaced.key]);
    }

    #[tokio::test]
    async fn test_discard_reports_failures() {
        let store = MemoryStore::new();
        for key in ["news/x/1.png", "news/x/2.png", "news/keep/3.png"] {
            store
                .put(key, Bytes::from_static(b"x"), "image/png")
                .await
                .unwrap();
        }
        store.fail_deletes_matching("keep").await;

        let keys: Vec<String> = store.keys().await;
        let failures = discard(&store, &keys).await;

        assert_eq!(failures, 1);
        assert_eq!(store.keys().await, vec!["news/keep/3.png".to_string()]);
    }
}
