//! # In-Memory Store
//!
//! A `BTreeMap`-backed [`DocumentStore`] for tests and ephemeral runs.
//!
//! The ordered map gives the same prefix-scan semantics as the SQLite
//! backend, so engine tests exercise identical code paths without a
//! database file.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::DocumentStore;

/// In-memory document store.
///
/// ## Usage
/// ```rust,ignore
/// let store = MemoryStore::new();
/// store.set("product:p1", serde_json::json!({"id": "p1"})).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of stored documents (for test assertions).
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// True when no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, document: Value) -> StoreResult<()> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.documents.write().await.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<Value>> {
        let documents = self.documents.read().await;
        Ok(documents
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }
}
