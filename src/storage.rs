// ABOUTME: Object store abstraction - fetch and persist bytes by key
// ABOUTME: GCS-backed implementation plus an in-memory store for tests

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use google_cloud_storage::client::Client as GcsClient;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use google_cloud_storage::http::Error as GcsError;

/// Storage failure classification. `NotFound` is a normal outcome on the
/// read path; `Transient` is safe for the caller to retry with backoff.
/// No retry happens inside the store itself.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage request failed: {0}")]
    Transient(String),
}

/// Abstraction over the backing object store. Both operations are
/// idempotent at the key level: re-uploading a key overwrites, re-fetching
/// is read-only. Concurrent writes to the same key race at the storage
/// layer and the last write wins; callers needing stronger guarantees use
/// content-derived keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch object bytes by key.
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Persist bytes at key with the given content type.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;
}

/// Google Cloud Storage implementation.
pub struct GcsStore {
    client: GcsClient,
    bucket: String,
}

impl GcsStore {
    pub fn new(client: GcsClient, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: key.to_string(),
            ..Default::default()
        };

        match self.client.download_object(&request, &Range::default()).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(GcsError::Response(resp)) if resp.code == 404 => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Transient(e.to_string())),
        }
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let mut media = Media::new(key.to_string());
        media.content_type = content_type.to_string().into();

        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        self.client
            .upload_object(&request, bytes, &UploadType::Simple(media))
            .await
            .map_err(|e| StorageError::Transient(e.to_string()))?;

        Ok(())
    }
}

/// In-memory store used by tests and local development.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, (Bytes, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::Transient(e.to_string()))?;
        objects
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StorageError::Transient(e.to_string()))?;
        objects.insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        let payload = Bytes::from_static(b"pixels");

        store
            .put("blog/photo.png", payload.clone(), "image/png")
            .await
            .unwrap();
        let fetched = store.get("blog/photo.png").await.unwrap();

        assert_eq!(fetched, payload);
    }

    #[tokio::test]
    async fn test_memory_store_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get("blog/missing.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = MemoryStore::new();
        store
            .put("blog/a.png", Bytes::from_static(b"v1"), "image/png")
            .await
            .unwrap();
        store
            .put("blog/a.png", Bytes::from_static(b"v2"), "image/png")
            .await
            .unwrap();

        assert_eq!(store.get("blog/a.png").await.unwrap(), Bytes::from_static(b"v2"));
        assert_eq!(store.len(), 1);
    }
}
