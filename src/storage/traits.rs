use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Whole-document key/value storage. Each key holds one JSON document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, document: Value) -> Result<()>;

    /// Returns whether a document was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn list(&self) -> Result<Vec<String>>;
    async fn stats(&self) -> Result<StorageStats>;

    async fn health_check(&self) -> Result<bool>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageStats {
    pub backend: String,
    pub documents: usize,
    pub storage_size_bytes: Option<u64>,
}
