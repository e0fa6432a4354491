use super::question::AnswerSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Generated,
    Uploaded,
}

/// One entry of the gallery. Order in the collection is the display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    #[serde(default)]
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<AnswerSet>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ImageSource>,
    /// Anything else stored on the entry (`posterType`, `style`, ...), kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local_path: None,
            prompt: String::new(),
            timestamp: Utc::now(),
            created_by: String::new(),
            answers: None,
            fields: BTreeMap::new(),
            revised_prompt: None,
            source: None,
            extra: Map::new(),
        }
    }

    pub fn with_local_path(mut self, local_path: impl Into<String>) -> Self {
        self.local_path = Some(local_path.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn with_source(mut self, source: ImageSource) -> Self {
        self.source = Some(source);
        self
    }

    /// True when `url` names this record by its remote url or its local path.
    pub fn matches(&self, url: &str) -> bool {
        !url.is_empty() && (self.url == url || self.local_path.as_deref() == Some(url))
    }

    /// A record is addressable when it has a non-empty url or local path.
    pub fn is_addressable(&self) -> bool {
        !self.url.trim().is_empty()
            || self
                .local_path
                .as_deref()
                .map_or(false, |path| !path.trim().is_empty())
    }

    /// Address served to viewers: the local copy when there is one.
    pub fn display_url(&self) -> &str {
        match self.local_path.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => &self.url,
        }
    }

    /// File name of the backing image file, taken from the local path (or url).
    pub fn file_name(&self) -> Option<&str> {
        let source = self.display_url();
        source
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && !source.contains("://"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub model: String,
    pub n: u32,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}

/// What the image API hands back: a fetchable url or the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Url(String),
    Base64(String),
}

#[derive(Debug, Clone)]
pub struct ImageGenerationResponse {
    pub image: GeneratedImage,
    pub revised_prompt: Option<String>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageResponse {
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub data: Vec<OpenAiImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiErrorResponse {
    pub error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiErrorBody {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    /// Base64-encoded file contents.
    pub data: String,
}
