use crate::{
    error::{AppError, Result},
    logger,
    models::{AnswerSet, GeneratedImage, ImageRecord, ImageSource, Questionnaire},
    openai::ImageGenerator,
    prompt::{self, AssembledPrompt},
    storage::files::{filename_timestamp, sanitize_name, ImageFileStore},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{display::DisplaySelector, image_store::ImageStore};

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub record: ImageRecord,
    pub displayed: bool,
}

/// Answers in, stored image out.
///
/// One attempt per request: a failed remote call is reported back and the
/// caller decides whether to resubmit.
pub struct GenerationOrchestrator {
    generator: Arc<dyn ImageGenerator>,
    images: Arc<ImageStore>,
    display: Arc<DisplaySelector>,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        images: Arc<ImageStore>,
        display: Arc<DisplaySelector>,
    ) -> Self {
        Self {
            generator,
            images,
            display,
        }
    }

    pub async fn generate_from_answers(
        &self,
        questionnaire: &Questionnaire,
        answers: AnswerSet,
    ) -> Result<GenerationOutcome> {
        if answers.is_empty() {
            return Err(AppError::Validation("No answers provided".into()));
        }
        prompt::check_required(questionnaire, &answers)?;

        let AssembledPrompt {
            prompt,
            created_by,
            fields,
        } = prompt::assemble(questionnaire, &answers);
        if prompt.trim().is_empty() {
            return Err(AppError::Validation(
                "Answers did not produce a prompt".into(),
            ));
        }
        log::info!("Assembled prompt for {}: {}", created_by, prompt);

        self.run(prompt, created_by, Some(answers), fields).await
    }

    /// Same pipeline with a caller-written prompt.
    pub async fn generate_from_prompt(
        &self,
        prompt: &str,
        created_by: &str,
    ) -> Result<GenerationOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Prompt is required".into()));
        }
        self.run(
            prompt.to_string(),
            created_by.trim().to_string(),
            None,
            BTreeMap::new(),
        )
        .await
    }

    async fn run(
        &self,
        prompt: String,
        created_by: String,
        answers: Option<AnswerSet>,
        fields: BTreeMap<String, String>,
    ) -> Result<GenerationOutcome> {
        let _timer = logger::timer("image generation");

        let response = self.generator.generate(&prompt).await.map_err(|e| {
            log::error!("Image generation failed: {}", e);
            e
        })?;

        let timestamp = Utc::now();
        let creator_slug = if created_by.is_empty() {
            "unknown".to_string()
        } else {
            sanitize_name(&created_by)
        };
        let filename = format!("image-{}-{}.png", filename_timestamp(timestamp), creator_slug);
        let local_path = ImageFileStore::public_path(&filename);

        let (url, bytes) = match response.image {
            GeneratedImage::Url(remote) => {
                let bytes = self.generator.download(&remote).await?;
                (remote, bytes)
            }
            GeneratedImage::Base64(data) => {
                let bytes = STANDARD.decode(data.trim()).map_err(|e| {
                    AppError::ExternalService(format!("Image data is not valid base64: {}", e))
                })?;
                (local_path.clone(), bytes)
            }
        };
        self.images.files().write(&filename, &bytes).await?;

        let record = ImageRecord {
            url,
            local_path: Some(local_path),
            prompt,
            timestamp,
            created_by,
            answers,
            fields,
            revised_prompt: response.revised_prompt,
            source: Some(ImageSource::Generated),
            extra: serde_json::Map::new(),
        };
        self.images.add(record.clone()).await?;

        let displayed = match self.display.promote_if_auto(&record).await {
            Ok(displayed) => displayed,
            Err(e) => {
                log::warn!("Image stored but display update failed: {}", e);
                false
            }
        };

        log::info!(
            "Generated image {} for {} with {}",
            record.display_url(),
            record.created_by,
            response.model
        );
        Ok(GenerationOutcome { record, displayed })
    }
}
