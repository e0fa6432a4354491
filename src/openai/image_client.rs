use crate::{
    config::{OpenAiConfig, ResponseFormat},
    error::{AppError, Result},
    models::{
        GeneratedImage, ImageGenerationRequest, ImageGenerationResponse, OpenAiErrorResponse,
        OpenAiImageResponse,
    },
    openai::ImageGenerator,
};
use async_trait::async_trait;
use reqwest::Client;

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    config: OpenAiConfig,
}

impl ImageClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("dall-e-3", "DALL·E 3", "OpenAI"),
            ("dall-e-2", "DALL·E 2", "OpenAI"),
            ("gpt-image-1", "GPT Image 1", "OpenAI"),
        ]
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str) -> ImageGenerationRequest {
        let params = ModelParams::for_model(&self.config.model);
        ImageGenerationRequest {
            prompt: prompt.to_string(),
            model: self.config.model.clone(),
            n: 1,
            size: self.config.size.clone(),
            quality: params.quality.then(|| self.config.quality.clone()),
            style: params.style.then(|| self.config.style.clone()),
            response_format: params
                .response_format
                .then(|| self.config.response_format.as_str().to_string()),
        }
    }
}

/// Optional request parameters a model accepts. The API rejects the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelParams {
    quality: bool,
    style: bool,
    response_format: bool,
}

impl ModelParams {
    fn for_model(model: &str) -> Self {
        match model {
            "dall-e-2" => Self {
                quality: false,
                style: false,
                response_format: true,
            },
            // Always answers with b64_json; quality takes low/medium/high only.
            "gpt-image-1" => Self {
                quality: false,
                style: false,
                response_format: false,
            },
            _ => Self {
                quality: true,
                style: true,
                response_format: true,
            },
        }
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, prompt: &str) -> Result<ImageGenerationResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OpenAI API key is not configured".into()))?;

        let request = self.build_request(prompt);
        log::info!(
            "Generating image with model: {} ({} chars of prompt)",
            request.model,
            prompt.len()
        );

        let response = self
            .client
            .post(format!(
                "{}/images/generations",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalService(format!("OpenAI response unreadable: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAiErrorResponse>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            return Err(AppError::ExternalService(format!(
                "OpenAI API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: OpenAiImageResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::ExternalService(format!("Invalid response from OpenAI: {}", e))
        })?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalService("No images generated".into()))?;

        let image = match (first.b64_json, first.url) {
            (Some(data), _) if !data.is_empty() => GeneratedImage::Base64(data),
            (_, Some(url)) if !url.is_empty() => GeneratedImage::Url(url),
            _ => {
                return Err(AppError::ExternalService(
                    "OpenAI response carried neither url nor image data".into(),
                ))
            }
        };

        if self.config.response_format == ResponseFormat::Url
            && matches!(image, GeneratedImage::Base64(_))
        {
            log::debug!("Asked for a url, OpenAI returned inline image data");
        }

        Ok(ImageGenerationResponse {
            image,
            revised_prompt: first.revised_prompt,
            model: request.model,
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("Downloading generated image from {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to download image: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Failed to download image: {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to download image: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
