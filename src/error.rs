use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("External service error: {0}")]
    ExternalService(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(feature = "server")]
mod http {
    use super::AppError;
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};
    use serde_json::json;

    impl ResponseError for AppError {
        fn status_code(&self) -> StatusCode {
            match self {
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
                AppError::Storage(_) | AppError::Config(_) | AppError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }

        fn error_response(&self) -> HttpResponse {
            let status = self.status_code();
            if status.is_server_error() {
                log::error!("Request failed: {}", self);
            } else {
                log::warn!("Request rejected: {}", self);
            }
            HttpResponse::build(status).json(json!({
                "success": false,
                "message": self.to_string(),
            }))
        }
    }
}
