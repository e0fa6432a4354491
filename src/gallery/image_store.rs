use crate::{
    error::{AppError, Result},
    models::ImageRecord,
    storage::{ImageFileStore, StorageManager},
};
use serde_json::Value;
use tokio::sync::Mutex;

pub const IMAGES_KEY: &str = "generated-images";

/// The ordered collection of generated and uploaded images.
///
/// Every mutation is a read-modify-write of the whole collection, serialized
/// through `write_lock` so concurrent requests in this process cannot drop
/// each other's changes.
pub struct ImageStore {
    storage: StorageManager,
    files: ImageFileStore,
    write_lock: Mutex<()>,
}

impl ImageStore {
    pub fn new(storage: StorageManager, files: ImageFileStore) -> Self {
        Self {
            storage,
            files,
            write_lock: Mutex::new(()),
        }
    }

    pub fn files(&self) -> &ImageFileStore {
        &self.files
    }

    /// All records in display order. Null and malformed entries are skipped.
    pub async fn list(&self) -> Result<Vec<ImageRecord>> {
        let entries = self.load_entries().await?;
        let total = entries.len();
        let records: Vec<ImageRecord> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<ImageRecord>(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping malformed image record: {}", e);
                    None
                }
            })
            .collect();

        if records.len() != total {
            log::debug!("Loaded {} of {} image entries", records.len(), total);
        }
        Ok(records)
    }

    pub async fn add(&self, record: ImageRecord) -> Result<()> {
        self.add_many(vec![record]).await
    }

    /// Appends to the stored collection. Existing entries are written back
    /// untouched, including ones `list` cannot read.
    pub async fn add_many(&self, new_records: Vec<ImageRecord>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;
        for record in &new_records {
            entries.push(serde_json::to_value(record)?);
        }
        self.storage.save(IMAGES_KEY, &entries).await
    }

    /// First record whose url or local path equals `url`.
    pub async fn find_by_url(&self, url: &str) -> Result<Option<ImageRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|record| record.matches(url)))
    }

    pub async fn update_answer(&self, url: &str, created_by: &str) -> Result<ImageRecord> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load_entries().await?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry_matches(entry, url))
            .ok_or_else(|| AppError::NotFound(format!("Image {}", url)))?;

        if let Some(fields) = entry.as_object_mut() {
            fields.insert("createdBy".to_string(), Value::String(created_by.to_string()));
        }
        let updated = record_from(entry);
        self.storage.save(IMAGES_KEY, &entries).await?;
        Ok(updated)
    }

    /// Removes the entry and, best-effort, its backing file.
    pub async fn delete(&self, url: &str) -> Result<ImageRecord> {
        let removed = {
            let _guard = self.write_lock.lock().await;
            let mut entries = self.load_entries().await?;
            let index = entries
                .iter()
                .position(|entry| entry_matches(entry, url))
                .ok_or_else(|| AppError::NotFound(format!("Image {}", url)))?;

            let removed = record_from(&entries.remove(index));
            self.storage.save(IMAGES_KEY, &entries).await?;
            removed
        };

        if let Some(filename) = removed.file_name() {
            if let Err(e) = self.files.remove(filename).await {
                log::warn!("Could not delete image file {}: {}", filename, e);
            }
        }

        log::info!("Deleted image {}", url);
        Ok(removed)
    }

    /// The stored collection as raw JSON, nulls dropped.
    async fn load_entries(&self) -> Result<Vec<Value>> {
        match self.storage.get_raw(IMAGES_KEY).await? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                Ok(items.into_iter().filter(|item| !item.is_null()).collect())
            }
            Some(other) => {
                log::warn!(
                    "{} is not a list (found {}), treating as empty",
                    IMAGES_KEY,
                    json_kind(&other)
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole collection with `records`, in the given order.
    pub async fn reorder(&self, records: Vec<ImageRecord>) -> Result<()> {
        if records.is_empty() {
            return Err(AppError::Validation("No valid images provided".into()));
        }
        if let Some(index) = records.iter().position(|record| !record.is_addressable()) {
            return Err(AppError::Validation(format!(
                "Image at position {} has neither url nor localPath",
                index
            )));
        }

        let _guard = self.write_lock.lock().await;
        self.storage.save(IMAGES_KEY, &records).await?;
        log::info!("Reordered {} images", records.len());
        Ok(())
    }
}

/// Matches on the raw `url` / `localPath` strings, so entries `list` skips
/// can still be renamed or deleted.
fn entry_matches(entry: &Value, url: &str) -> bool {
    !url.is_empty()
        && ["url", "localPath"]
            .iter()
            .any(|key| entry.get(key).and_then(Value::as_str) == Some(url))
}

/// Typed view of a stored entry; unreadable entries keep just their addresses.
fn record_from(entry: &Value) -> ImageRecord {
    match serde_json::from_value::<ImageRecord>(entry.clone()) {
        Ok(record) => record,
        Err(_) => {
            let text = |key: &str| entry.get(key).and_then(Value::as_str).map(String::from);
            let mut record = ImageRecord::new(text("url").unwrap_or_default());
            record.local_path = text("localPath");
            record.created_by = text("createdBy").unwrap_or_default();
            record
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
