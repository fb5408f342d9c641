//! In-memory [`DocumentStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::errors::StorageError;
use crate::interfaces::{guess_content_type, validate_key, DocumentStore};
use crate::types::StoredObject;

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
    modified_at: DateTime<Utc>,
}

/// Document store held in a sorted map.
pub struct InMemoryDocumentStore {
    objects: RwLock<BTreeMap<String, StoredBlob>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store or replace an object. Test fixtures use this to edit cases in place.
    pub async fn put(&self, key: impl Into<String>, bytes: Vec<u8>) {
        let key = key.into();
        let content_type = guess_content_type(&key).to_string();
        self.objects.write().await.insert(
            key,
            StoredBlob {
                bytes,
                content_type,
                modified_at: Utc::now(),
            },
        );
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        self.objects
            .read()
            .await
            .get(key)
            .map(|blob| blob.bytes.clone())
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn write_if_absent(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(StorageError::already_exists(key));
        }

        objects.insert(
            key.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type
                    .map(str::to_string)
                    .unwrap_or_else(|| guess_content_type(key).to_string()),
                modified_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        Ok(self
            .objects
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, blob)| StoredObject {
                name: key.clone(),
                size: blob.bytes.len() as u64,
                content_type: Some(blob.content_type.clone()),
                modified_at: Some(blob.modified_at),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_if_absent_refuses_overwrite() {
        let store = InMemoryDocumentStore::new();
        store.write_if_absent("INC-1/case.json", b"{}", None).await.unwrap();

        let err = store
            .write_if_absent("INC-1/case.json", b"[]", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.read("INC-1/case.json").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_read_missing() {
        let store = InMemoryDocumentStore::new();
        let err = store.read("INC-1/case.json").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(!store.exists("INC-1/case.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let store = InMemoryDocumentStore::new();
        store.put("INC-1/case.json", b"{}".to_vec()).await;
        store
            .write_if_absent("INC-1/evidence/a.bin", b"abc", Some("application/x-test"))
            .await
            .unwrap();
        store.put("INC-2/case.json", b"{}".to_vec()).await;

        let all = store.list("").await.unwrap();
        assert_eq!(all.len(), 3);

        let evidence = store.list("INC-1/evidence/").await.unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].size, 3);
        assert_eq!(evidence[0].content_type.as_deref(), Some("application/x-test"));
    }
}
