pub mod image_client;

use crate::{error::Result, models::ImageGenerationResponse};
use async_trait::async_trait;

pub use image_client::ImageClient;

/// The remote image-generation capability: one square image per prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ImageGenerationResponse>;

    /// Fetches the bytes behind a url returned by `generate`.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
