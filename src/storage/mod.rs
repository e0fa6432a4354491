pub mod files;
pub mod json_file;
pub mod memory;
pub mod traits;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::Result,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use traits::DocumentStore;

pub use files::ImageFileStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::{DocumentStore as DocumentStoreTrait, StorageStats};

/// Picks the document backend from configuration and offers typed access to it.
#[derive(Clone)]
pub struct StorageManager {
    backend: Arc<dyn DocumentStore>,
}

impl StorageManager {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let backend: Arc<dyn DocumentStore> = match config.backend {
            StorageBackend::JsonFile => Arc::new(JsonFileStore::new(&config.data_dir).await?),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        log::info!("Document storage ready ({:?})", config.backend);
        Ok(Self { backend })
    }

    pub fn with_backend(backend: Arc<dyn DocumentStore>) -> Self {
        Self { backend }
    }

    pub fn memory() -> Self {
        Self::with_backend(Arc::new(MemoryStore::new()))
    }

    pub fn storage(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }
}

impl StorageManager {
    pub async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.backend.get(key).await
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, document: &T) -> Result<()> {
        self.backend.put(key, serde_json::to_value(document)?).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        self.backend.list().await
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        self.backend.stats().await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }
}
