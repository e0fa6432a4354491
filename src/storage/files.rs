use crate::error::{AppError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Public prefix under which stored image files are addressed.
pub const STORED_IMAGES_PREFIX: &str = "/stored-images";

/// Image files on local disk, addressed by bare file name.
#[derive(Debug, Clone)]
pub struct ImageFileStore {
    dir: PathBuf,
}

impl ImageFileStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Storage(format!("Cannot create image dir {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Address of a stored file as recorded in `localPath`.
    pub fn public_path(filename: &str) -> String {
        format!("{}/{}", STORED_IMAGES_PREFIX, filename)
    }

    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(filename)?;
        fs::write(&path, bytes).await.map_err(|e| {
            AppError::Storage(format!("Failed to write image {}: {}", path.display(), e))
        })?;
        log::info!("Stored image {} ({} bytes)", filename, bytes.len());
        Ok(path)
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)
            .map_err(|_| AppError::NotFound(format!("Image file {}", filename)))?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Image file {}", filename)))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read image {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Best-effort removal; a file that is already gone is not an error.
    pub async fn remove(&self, filename: &str) -> Result<bool> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted image file {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Image file {} was already gone", path.display());
                Ok(false)
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to delete image {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(AppError::Validation(format!(
                "Invalid image file name: {:?}",
                filename
            )));
        }
        Ok(self.dir.join(filename))
    }
}

fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}

/// Lowercase, with every character outside `[a-z0-9]` replaced by `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `2024-12-01T10:00:00.000Z` becomes `2024-12-01T10-00-00-000Z`.
pub fn filename_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Content type for a stored image, by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
