//! In-memory object store for tests and demo runs.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::modules::storage::ObjectStore;

#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("Object not found: '{}'", key)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn size(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .objects
            .read()
            .await
            .get(key)
            .map(|data| data.len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_roundtrip() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store
                .put("uploads/c/1.csv", b"a,b\n".to_vec(), "text/csv")
                .await
                .unwrap();

            assert_eq!(store.size("uploads/c/1.csv").await.unwrap(), Some(4));
            assert_eq!(store.get("uploads/c/1.csv").await.unwrap(), b"a,b\n");

            store.delete("uploads/c/1.csv").await.unwrap();
            assert!(!store.exists("uploads/c/1.csv").await.unwrap());
            assert_eq!(store.size("uploads/c/1.csv").await.unwrap(), None);
        });
    }

    #[test]
    fn get_missing_is_a_storage_error() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let err = store.get("uploads/c/missing.csv").await.unwrap_err();
            assert!(matches!(err, AppError::Storage(_)));
        });
    }
}
