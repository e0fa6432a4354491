use crate::{
    error::Result,
    storage::traits::{DocumentStore, StorageStats},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local documents; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, document: Value) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.documents.write().await.remove(key).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.documents.read().await.keys().cloned().collect())
    }

    async fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            backend: "memory".to_string(),
            documents: self.documents.read().await.len(),
            storage_size_bytes: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
