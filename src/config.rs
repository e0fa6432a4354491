use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Url,
    B64Json,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Url => "url",
            ResponseFormat::B64Json => "b64_json",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "url" => Ok(ResponseFormat::Url),
            "b64_json" | "base64" => Ok(ResponseFormat::B64Json),
            other => Err(AppError::Config(format!(
                "Unknown image response format: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    pub style: String,
    pub response_format: ResponseFormat,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        OpenAiConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
            style: "vivid".to_string(),
            response_format: ResponseFormat::Url,
        }
    }
}

impl OpenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let response_format = match env::var("OPENAI_RESPONSE_FORMAT") {
            Ok(value) => ResponseFormat::parse(&value)?,
            Err(_) => defaults.response_format,
        };

        Ok(OpenAiConfig {
            api_key: env::var("OPENAI_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.model),
            size: env::var("OPENAI_IMAGE_SIZE").unwrap_or(defaults.size),
            quality: env::var("OPENAI_IMAGE_QUALITY").unwrap_or(defaults.quality),
            style: env::var("OPENAI_IMAGE_STYLE").unwrap_or(defaults.style),
            response_format,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    JsonFile,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" | "file" => Ok(StorageBackend::JsonFile),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(AppError::Config(format!(
                "Unknown storage backend: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub images_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::JsonFile,
            data_dir: PathBuf::from("."),
            images_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::JsonFile,
        };

        Ok(StorageConfig {
            backend,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            images_dir: env::var("IMAGES_DIR").ok().map(PathBuf::from),
        })
    }

    pub fn with_backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_images_dir(mut self, images_dir: impl Into<PathBuf>) -> Self {
        self.images_dir = Some(images_dir.into());
        self
    }

    /// Directory holding generated and uploaded image files.
    pub fn images_dir(&self) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("stored-images"))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub questions_path: Option<PathBuf>,
    pub log_level: String,
    pub log_json: bool,
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_path: String::new(),
            questions_path: None,
            log_level: "info".to_string(),
            log_json: false,
            openai: OpenAiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let port = match env::var("PORT") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid PORT value: {}", value)))?,
            Err(_) => defaults.port,
        };
        let log_json = env::var("LOG_JSON").ok().map_or(false, |val| val == "true");

        Ok(Config {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            base_path: normalize_base_path(&env::var("BASE_PATH").unwrap_or_default()),
            questions_path: env::var("QUESTIONS_PATH").ok().map(PathBuf::from),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json,
            openai: OpenAiConfig::from_env()?,
            storage: StorageConfig::from_env()?,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    pub fn with_questions_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.questions_path = Some(path.into());
        self
    }

    pub fn with_openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn questions_path(&self) -> PathBuf {
        self.questions_path
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("questions.json"))
    }
}

/// Leading slash, no trailing slash; empty means "mounted at the root".
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
