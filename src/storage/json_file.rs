use crate::{
    error::{AppError, Result},
    storage::traits::{DocumentStore, StorageStats},
};
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// One pretty-printed `<key>.json` file per document inside `root`.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::Storage(format!("Cannot create data dir {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, EXTENSION)))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Storage(format!("Invalid document key: {:?}", key)))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            AppError::Storage(format!("Corrupt document {}: {}", path.display(), e))
        })
    }

    async fn put(&self, key: &str, document: Value) -> Result<()> {
        let path = self.path_for(key)?;
        let body = serde_json::to_string_pretty(&document)?;

        // Write next to the target and rename so readers never see half a file.
        let tmp = self.root.join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));
        fs::write(&tmp, body.as_bytes()).await.map_err(|e| {
            AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::Storage(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        log::debug!("Saved document {} ({} bytes)", key, body.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn stats(&self) -> Result<StorageStats> {
        let keys = self.list().await?;
        let mut size = 0u64;
        for key in &keys {
            if let Ok(meta) = fs::metadata(self.path_for(key)?).await {
                size += meta.len();
            }
        }

        Ok(StorageStats {
            backend: "json".to_string(),
            documents: keys.len(),
            storage_size_bytes: Some(size),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn round_trips_documents_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();

        assert_eq!(store.get("generated-images").await.unwrap(), None);

        store
            .put("generated-images", json!([{"url": "/stored-images/a.png"}]))
            .await
            .unwrap();
        let raw = std::fs::read_to_string(dir.path().join("generated-images.json")).unwrap();
        assert!(raw.contains("\n  {"), "documents are pretty-printed");

        assert_eq!(
            store.get("generated-images").await.unwrap(),
            Some(json!([{"url": "/stored-images/a.png"}]))
        );
        assert_eq!(store.list().await.unwrap(), vec!["generated-images"]);

        assert!(store.delete("generated-images").await.unwrap());
        assert!(!store.delete("generated-images").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();

        assert!(store.get("../etc/passwd").await.is_err());
        assert!(store.put("a/b", json!({})).await.is_err());
    }

    #[tokio::test]
    async fn corrupt_documents_are_storage_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("display-image.json"), "{not json").unwrap();
        let store = JsonFileStore::new(dir.path()).await.unwrap();

        assert!(matches!(
            store.get("display-image").await,
            Err(AppError::Storage(_))
        ));
    }
}
