pub mod handlers;

use crate::{
    config::Config,
    error::{AppError, Result},
    gallery::Gallery,
    models::Questionnaire,
    openai::{ImageClient, ImageGenerator},
    storage::{ImageFileStore, StorageManager},
};
use actix_web::{error::JsonPayloadError, middleware, web, App, HttpRequest, HttpServer};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Uploads arrive base64-encoded inside JSON.
const JSON_LIMIT_BYTES: usize = 32 * 1024 * 1024;

pub struct AppState {
    pub gallery: Gallery,
    pub questionnaire: Arc<Questionnaire>,
    pub base_path: String,
}

impl AppState {
    pub fn new(gallery: Gallery, questionnaire: Questionnaire, base_path: &str) -> Self {
        Self {
            gallery,
            questionnaire: Arc::new(questionnaire),
            base_path: base_path.to_string(),
        }
    }

    /// Wires storage, the OpenAI client and the questionnaire from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = StorageManager::new(&config.storage).await?;
        let files = ImageFileStore::new(config.storage.images_dir()).await?;
        let generator: Arc<dyn ImageGenerator> = Arc::new(ImageClient::new(config.openai.clone()));
        let questionnaire = load_questionnaire(&config.questions_path()).await?;

        Ok(Self::new(
            Gallery::new(storage, files, generator),
            questionnaire,
            &config.base_path,
        ))
    }
}

pub async fn load_questionnaire(path: &Path) -> Result<Questionnaire> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Config(format!("Cannot read questions from {}: {}", path.display(), e))
    })?;
    let questionnaire = Questionnaire::from_json(&raw).map_err(|e| {
        AppError::Config(format!("Invalid questions file {}: {}", path.display(), e))
    })?;
    log::info!(
        "Loaded {} questions from {}",
        questionnaire.questions.len(),
        path.display()
    );
    Ok(questionnaire)
}

/// Malformed JSON bodies get the same `{success, message}` shape as other failures.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = format!("Invalid request body: {}", err);
    log::warn!("{}", message);
    actix_web::error::InternalError::from_response(
        err,
        actix_web::HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": message,
        })),
    )
    .into()
}

/// Registers every route under `base_path`.
pub fn configure(base_path: &str) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(
            web::JsonConfig::default()
                .limit(JSON_LIMIT_BYTES)
                .error_handler(json_error),
        )
        .service(
            web::scope(base_path)
                .route("/api/config", web::get().to(handlers::get_config))
                .route("/api/health", web::get().to(handlers::health))
                .route("/api/questions", web::get().to(handlers::list_questions))
                .route(
                    "/api/questions/generate",
                    web::post().to(handlers::generate_from_answers),
                )
                .route("/api/images", web::get().to(handlers::list_images))
                .route(
                    "/api/images/generate",
                    web::post().to(handlers::generate_from_prompt),
                )
                .route("/api/images/delete", web::post().to(handlers::delete_image))
                .route("/api/images/reorder", web::post().to(handlers::reorder_images))
                .route(
                    "/api/images/update-answer",
                    web::post().to(handlers::update_answer),
                )
                .route("/api/images/upload", web::post().to(handlers::upload_images))
                .service(
                    web::resource("/api/images/display")
                        .route(web::get().to(handlers::get_display))
                        .route(web::post().to(handlers::set_display)),
                )
                .route(
                    "/api/images/display/toggle-creator",
                    web::post().to(handlers::toggle_creator),
                )
                .route(
                    "/api/images/display/auto-display",
                    web::get().to(handlers::get_auto_display),
                )
                .route(
                    "/api/images/display/toggle-auto-display",
                    web::post().to(handlers::toggle_auto_display),
                )
                .route(
                    "/api/images/display/settings",
                    web::post().to(handlers::update_display_settings),
                )
                .service(
                    web::resource("/api/admin/settings")
                        .route(web::get().to(handlers::get_admin_settings))
                        .route(web::post().to(handlers::update_admin_settings)),
                )
                .route(
                    "/stored-images/{filename}",
                    web::get().to(handlers::stored_image),
                ),
        );
    }
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let state = AppState::from_config(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(state);
    let base_path = config.base_path.clone();

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::new("%r %s %Dms"))
            .configure(configure(&base_path))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
