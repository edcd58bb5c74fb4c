//! Object storage abstraction.
//!
//! All pipeline stages talk to storage through this trait so the MinIO
//! backend can be swapped for the in-memory one in tests and demo runs.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::StorageConfig;
use crate::core::error::Result;
use crate::modules::storage::{MemoryStore, MinioStore};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, overwriting any existing one at the key.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Read an object in full. Missing objects are a `Storage` error;
    /// callers that need to distinguish absence use `exists`/`size` first.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Physical object size in bytes, or `None` if the object is missing.
    async fn size(&self, key: &str) -> Result<Option<i64>>;

    /// Copy an object to another key. The default reads and rewrites;
    /// backends with a native copy may override.
    async fn copy(&self, src: &str, dest: &str) -> Result<()> {
        let data = self.get(src).await?;
        self.put(dest, data, "application/octet-stream").await
    }
}

/// Build the configured storage backend.
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory object store; objects are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        _ => {
            let store = MinioStore::new(config)?;
            store.ensure_bucket_exists().await?;
            tracing::info!("MinIO object store ready (bucket '{}')", store.bucket_name());
            Ok(Arc::new(store))
        }
    }
}

/// Move an object between keys: copy, then delete the source.
///
/// Idempotent by construction, safe to re-run after a crash at any point:
/// if the destination already exists the copy is skipped, and a source that
/// is already gone is not an error. `src == dest` is a no-op so re-routing
/// an already-moved record never deletes the object.
pub async fn move_object(store: &dyn ObjectStore, src: &str, dest: &str) -> Result<()> {
    if src == dest {
        return Ok(());
    }

    if !store.exists(dest).await? {
        store.copy(src, dest).await?;
    }

    if store.exists(src).await? {
        store.delete(src).await?;
    }

    Ok(())
}

impl dyn ObjectStore {
    /// Convenience wrapper so call sites read `store.move_to(src, dest)`.
    pub async fn move_to(&self, src: &str, dest: &str) -> Result<()> {
        move_object(self, src, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    #[tokio::test]
    async fn move_copies_then_deletes_source() {
        let store = MemoryStore::new();
        store
            .put("uploads/c/2026/01/01/a.csv", b"x,y\n1,2\n".to_vec(), "text/csv")
            .await
            .unwrap();

        move_object(&store, "uploads/c/2026/01/01/a.csv", "staging/c/2026/01/01/a.csv")
            .await
            .unwrap();

        assert!(!store.exists("uploads/c/2026/01/01/a.csv").await.unwrap());
        assert!(store.exists("staging/c/2026/01/01/a.csv").await.unwrap());
    }

    #[tokio::test]
    async fn move_retry_after_partial_crash_converges() {
        let store = MemoryStore::new();
        let src = "uploads/c/2026/01/01/a.csv";
        let dest = "rejected/c/2026/01/01/a.csv";
        store.put(src, b"data".to_vec(), "text/csv").await.unwrap();

        // Simulate a crash between copy and delete: destination written,
        // source still present.
        let data = store.get(src).await.unwrap();
        store.put(dest, data, "text/csv").await.unwrap();

        // Retry converges to exactly one copy.
        move_object(&store, src, dest).await.unwrap();
        assert!(!store.exists(src).await.unwrap());
        assert!(store.exists(dest).await.unwrap());

        // A second retry (source already gone) is a no-op.
        move_object(&store, src, dest).await.unwrap();
        assert!(store.exists(dest).await.unwrap());
    }

    #[tokio::test]
    async fn move_to_same_key_keeps_object() {
        let store = MemoryStore::new();
        let key = "staging/c/2026/01/01/a.csv";
        store.put(key, b"data".to_vec(), "text/csv").await.unwrap();

        move_object(&store, key, key).await.unwrap();
        assert!(store.exists(key).await.unwrap());
    }
}
