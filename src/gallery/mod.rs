pub mod display;
pub mod generator;
pub mod image_store;
pub mod settings;

use crate::{
    error::{AppError, Result},
    models::{ImageRecord, ImageSource, UploadedFile},
    openai::ImageGenerator,
    storage::{
        files::{filename_timestamp, sanitize_name},
        ImageFileStore, StorageManager,
    },
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::sync::Arc;

pub use display::DisplaySelector;
pub use generator::{GenerationOrchestrator, GenerationOutcome};
pub use image_store::ImageStore;
pub use settings::SettingsStore;

/// Everything the service keeps: images, the display slot, admin settings,
/// and the pipeline that fills them.
#[derive(Clone)]
pub struct Gallery {
    images: Arc<ImageStore>,
    display: Arc<DisplaySelector>,
    settings: Arc<SettingsStore>,
    generator: Arc<GenerationOrchestrator>,
    storage: StorageManager,
}

impl Gallery {
    pub fn new(
        storage: StorageManager,
        files: ImageFileStore,
        image_generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let images = Arc::new(ImageStore::new(storage.clone(), files));
        let display = Arc::new(DisplaySelector::new(storage.clone()));
        let settings = Arc::new(SettingsStore::new(storage.clone()));
        let generator = Arc::new(GenerationOrchestrator::new(
            image_generator,
            Arc::clone(&images),
            Arc::clone(&display),
        ));

        Self {
            images,
            display,
            settings,
            generator,
            storage,
        }
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn display(&self) -> &DisplaySelector {
        &self.display
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn generator(&self) -> &GenerationOrchestrator {
        &self.generator
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Deletes the image and clears the display if it was showing it.
    pub async fn delete_image(&self, url: &str) -> Result<ImageRecord> {
        if url.trim().is_empty() {
            return Err(AppError::Validation("No image URL provided".into()));
        }
        let removed = self.images.delete(url).await?;
        if let Err(e) = self.display.clear_if_showing(&removed).await {
            log::error!("Image {} deleted but display not cleared: {}", url, e);
            return Err(e);
        }
        Ok(removed)
    }

    /// Renames an image's creator, on the record and on the display.
    pub async fn update_answer(&self, url: &str, created_by: &str) -> Result<ImageRecord> {
        if url.trim().is_empty() {
            return Err(AppError::Validation("URL is required".into()));
        }
        let updated = self.images.update_answer(url, created_by).await?;
        self.display.rename_if_showing(&updated).await?;
        Ok(updated)
    }

    /// Applies a new order. The display is cleared if its image was left out.
    pub async fn reorder(&self, records: Vec<ImageRecord>) -> Result<()> {
        self.images.reorder(records.clone()).await?;
        if self.display.clear_unless_listed(&records).await? {
            log::warn!("Displayed image was dropped by a reorder, display cleared");
        }
        Ok(())
    }

    /// Stores pre-made images as gallery entries with no creator.
    pub async fn upload(&self, files: Vec<UploadedFile>) -> Result<Vec<ImageRecord>> {
        if files.is_empty() {
            return Err(AppError::Validation("No files uploaded".into()));
        }

        let mut decoded = Vec::with_capacity(files.len());
        for file in &files {
            let bytes = STANDARD.decode(file.data.trim()).map_err(|e| {
                AppError::Validation(format!("{} is not valid base64: {}", file.filename, e))
            })?;
            if bytes.is_empty() {
                return Err(AppError::Validation(format!("{} is empty", file.filename)));
            }
            decoded.push((upload_filename(&file.filename), bytes));
        }

        let mut records = Vec::with_capacity(decoded.len());
        for (filename, bytes) in decoded {
            self.images.files().write(&filename, &bytes).await?;
            let path = ImageFileStore::public_path(&filename);
            records.push(
                ImageRecord::new(path.clone())
                    .with_local_path(path)
                    .with_source(ImageSource::Uploaded),
            );
        }

        self.images.add_many(records.clone()).await?;
        log::info!("Uploaded {} images", records.len());
        Ok(records)
    }
}

/// `image-<timestamp>-<name>.<ext>`, with the name and extension sanitized.
fn upload_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, sanitize_name(ext)),
        _ => (base, "png".to_string()),
    };
    format!(
        "image-{}-{}-{}.{}",
        filename_timestamp(Utc::now()),
        &uuid::Uuid::new_v4().simple().to_string()[..8],
        sanitize_name(stem),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::generator::tests::FakeGenerator;
    use super::*;
    use crate::models::DisplayUpdate;

    async fn gallery() -> (Gallery, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let files = ImageFileStore::new(dir.path()).await.unwrap();
        let gallery = Gallery::new(
            StorageManager::memory(),
            files,
            Arc::new(FakeGenerator::inline(b"png")),
        );
        (gallery, dir)
    }

    #[tokio::test]
    async fn deleting_the_displayed_image_clears_the_display() {
        let (gallery, _dir) = gallery().await;
        let outcome = gallery
            .generator()
            .generate_from_prompt("a red barn", "Alice")
            .await
            .unwrap();
        assert_eq!(
            gallery.display().read().await.unwrap().url,
            outcome.record.display_url()
        );

        gallery.delete_image(&outcome.record.url).await.unwrap();

        let state = gallery.display().read().await.unwrap();
        assert_eq!(state.url, "");
        assert_eq!(state.created_by, "");
        assert!(state.show_created_by);
        assert!(gallery.images().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_image_is_not_found() {
        let (gallery, _dir) = gallery().await;
        gallery
            .generator()
            .generate_from_prompt("a red barn", "Alice")
            .await
            .unwrap();

        let err = gallery.delete_image("/stored-images/none.png").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(gallery.images().list().await.unwrap().len(), 1);
        assert!(matches!(
            gallery.delete_image("").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn renaming_the_displayed_image_updates_display() {
        let (gallery, _dir) = gallery().await;
        let outcome = gallery
            .generator()
            .generate_from_prompt("a red barn", "Alice")
            .await
            .unwrap();

        let updated = gallery
            .update_answer(outcome.record.display_url(), "Alicia")
            .await
            .unwrap();
        assert_eq!(updated.created_by, "Alicia");
        assert_eq!(gallery.display().read().await.unwrap().created_by, "Alicia");
    }

    #[tokio::test]
    async fn reorder_that_drops_the_displayed_image_clears_display() {
        let (gallery, _dir) = gallery().await;
        let shown = gallery
            .generator()
            .generate_from_prompt("a red barn", "Alice")
            .await
            .unwrap();
        let other = gallery
            .generator()
            .generate_from_prompt("a blue lake", "Bob")
            .await
            .unwrap();
        gallery
            .display()
            .write(DisplayUpdate {
                url: Some(shown.record.display_url().to_string()),
                created_by: Some("Alice".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        gallery.reorder(vec![other.record.clone()]).await.unwrap();

        let images = gallery.images().list().await.unwrap();
        assert_eq!(images.len(), 1);
        let state = gallery.display().read().await.unwrap();
        assert_eq!(state.url, "");
        assert_eq!(state.created_by, "");
        assert!(gallery
            .images()
            .find_by_url(shown.record.display_url())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn reorder_keeping_the_displayed_image_leaves_display() {
        let (gallery, _dir) = gallery().await;
        let shown = gallery
            .generator()
            .generate_from_prompt("a red barn", "Alice")
            .await
            .unwrap();
        let mut records = gallery.images().list().await.unwrap();
        records.reverse();

        gallery.reorder(records).await.unwrap();

        assert_eq!(
            gallery.display().read().await.unwrap().url,
            shown.record.display_url()
        );
    }

    #[tokio::test]
    async fn uploads_become_uncredited_records() {
        let (gallery, _dir) = gallery().await;
        let records = gallery
            .upload(vec![
                UploadedFile {
                    filename: "Family Photo.JPG".into(),
                    data: STANDARD.encode(b"jpeg-bytes"),
                },
                UploadedFile {
                    filename: "card.png".into(),
                    data: STANDARD.encode(b"png-bytes"),
                },
            ])
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert!(first.url.starts_with("/stored-images/image-"));
        assert!(first.url.ends_with("-family_photo.jpg"));
        assert_eq!(first.created_by, "");
        assert_eq!(first.source, Some(ImageSource::Uploaded));
        assert_eq!(
            gallery
                .images()
                .files()
                .read(first.file_name().unwrap())
                .await
                .unwrap(),
            b"jpeg-bytes".to_vec()
        );
        assert_eq!(gallery.images().list().await.unwrap(), records);
    }

    #[tokio::test]
    async fn bad_uploads_are_rejected_before_writing() {
        let (gallery, _dir) = gallery().await;
        assert!(matches!(
            gallery.upload(Vec::new()).await,
            Err(AppError::Validation(_))
        ));
        let bad = UploadedFile {
            filename: "x.png".into(),
            data: "!!not base64!!".into(),
        };
        assert!(matches!(
            gallery.upload(vec![bad]).await,
            Err(AppError::Validation(_))
        ));
        assert!(gallery.images().list().await.unwrap().is_empty());
    }

    #[test]
    fn upload_names_drop_directories() {
        let name = upload_filename("../../evil/../Snow Man.PNG");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with("-snow_man.png"));
        assert!(!name.contains('/'));
    }
}
