//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoredDocument, VersionToken};

/// Keeps documents in a shared map and issues a fresh UUID v7 token on
/// every write. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, StoredDocument>>>,
    operations: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of fetch and store calls served so far.
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Place a document directly, bypassing the precondition check.
    pub async fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> VersionToken {
        let version = next_token();
        self.docs.write().await.insert(
            path.to_string(),
            StoredDocument {
                content: content.into(),
                version: version.clone(),
            },
        );
        version
    }

    /// Current raw content at `path`, without counting as an operation.
    pub async fn peek(&self, path: &str) -> Option<StoredDocument> {
        self.docs.read().await.get(path).cloned()
    }
}

fn next_token() -> VersionToken {
    VersionToken::new(Uuid::now_v7().simple().to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, path: &str) -> Result<Option<StoredDocument>, StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn store(
        &self,
        path: &str,
        content: Vec<u8>,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let mut docs = self.docs.write().await;

        let current = docs.get(path).map(|doc| &doc.version);
        if current != expected {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }

        let version = next_token();
        docs.insert(
            path.to_string(),
            StoredDocument {
                content,
                version: version.clone(),
            },
        );
        Ok(version)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = MemoryStore::new();
        assert!(store.fetch("data/movies.json").await.unwrap().is_none());
        assert_eq!(store.operation_count(), 1);
    }

    #[tokio::test]
    async fn create_then_update_with_token() {
        let store = MemoryStore::new();
        let v1 = store.store("a.json", b"1".to_vec(), None).await.unwrap();
        let v2 = store.store("a.json", b"2".to_vec(), Some(&v1)).await.unwrap();
        assert_ne!(v1, v2);

        let doc = store.fetch("a.json").await.unwrap().unwrap();
        assert_eq!(doc.content, b"2");
        assert_eq!(doc.version, v2);
    }

    #[tokio::test]
    async fn stale_token_conflicts() {
        let store = MemoryStore::new();
        let v1 = store.store("a.json", b"1".to_vec(), None).await.unwrap();
        store.store("a.json", b"2".to_vec(), Some(&v1)).await.unwrap();

        let err = store.store("a.json", b"3".to_vec(), Some(&v1)).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.peek("a.json").await.unwrap().content, b"2");
    }

    #[tokio::test]
    async fn create_over_existing_conflicts() {
        let store = MemoryStore::new();
        store.seed("a.json", "[]").await;

        let err = store.store("a.json", b"[1]".to_vec(), None).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn token_for_missing_document_conflicts() {
        let store = MemoryStore::new();
        let bogus = VersionToken::new("abc123");
        let err = store.store("a.json", b"[]".to_vec(), Some(&bogus)).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
