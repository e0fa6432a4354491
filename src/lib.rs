//! Questionnaire answers in, generated images out.
//!
//! Answers are rendered through per-question templates into a single prompt,
//! the prompt goes to the image-generation API, and the resulting image is
//! stored, listed and optionally promoted to the audience-facing display.

pub mod config;
pub mod error;
pub mod gallery;
pub mod logger;
pub mod models;
pub mod openai;
pub mod prompt;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{Config, OpenAiConfig, StorageConfig};
pub use error::{AppError, Result};
pub use gallery::{DisplaySelector, Gallery, GenerationOrchestrator, ImageStore};
pub use models::*;
pub use openai::{ImageClient, ImageGenerator};
pub use storage::{DocumentStoreTrait as DocumentStore, StorageManager};
