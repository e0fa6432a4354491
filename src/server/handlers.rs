use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{AnswerSet, DisplaySettings, DisplayUpdate, ImageRecord, UploadedFile},
    storage::files::content_type_for,
};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Deserialize)]
pub struct GenerateFromAnswers {
    #[serde(default)]
    pub answers: Option<AnswerSet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFromPrompt {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImage {
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderImages {
    pub images: Vec<Option<ImageRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAnswer {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadImages {
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCreator {
    pub show_created_by: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAutoDisplay {
    pub auto_display: Option<bool>,
}

pub async fn get_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "basePath": state.base_path }))
}

pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    let healthy = state.gallery.storage().health_check().await?;
    let stats = state.gallery.storage().stats().await?;
    let body = json!({ "healthy": healthy, "storage": stats });
    Ok(if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    })
}

pub async fn list_questions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(&state.questionnaire.questions)
}

pub async fn generate_from_answers(
    state: web::Data<AppState>,
    body: web::Json<GenerateFromAnswers>,
) -> Result<HttpResponse> {
    let answers = body
        .into_inner()
        .answers
        .ok_or_else(|| AppError::Validation("No answers provided".into()))?;
    log::debug!("Received {} answers", answers.len());

    let outcome = state
        .gallery
        .generator()
        .generate_from_answers(&state.questionnaire, answers)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image generated and saved successfully",
        "imageUrl": outcome.record.display_url(),
        "displayed": outcome.displayed,
    })))
}

pub async fn generate_from_prompt(
    state: web::Data<AppState>,
    body: web::Json<GenerateFromPrompt>,
) -> Result<HttpResponse> {
    let outcome = state
        .gallery
        .generator()
        .generate_from_prompt(&body.prompt, &body.created_by)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image generated successfully",
        "url": outcome.record.display_url(),
        "displayed": outcome.displayed,
    })))
}

pub async fn list_images(state: web::Data<AppState>) -> Result<HttpResponse> {
    let images = state.gallery.images().list().await?;
    Ok(HttpResponse::Ok().json(images))
}

pub async fn delete_image(
    state: web::Data<AppState>,
    body: web::Json<DeleteImage>,
) -> Result<HttpResponse> {
    state.gallery.delete_image(&body.image_url).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image deleted successfully",
    })))
}

pub async fn reorder_images(
    state: web::Data<AppState>,
    body: web::Json<ReorderImages>,
) -> Result<HttpResponse> {
    // Null slots are dropped; an all-null payload is rejected as empty.
    let images: Vec<ImageRecord> = body.into_inner().images.into_iter().flatten().collect();

    state.gallery.reorder(images).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Image order updated successfully",
    })))
}

pub async fn update_answer(
    state: web::Data<AppState>,
    body: web::Json<UpdateAnswer>,
) -> Result<HttpResponse> {
    let image = state.gallery.update_answer(&body.url, &body.answer).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "image": image })))
}

pub async fn upload_images(
    state: web::Data<AppState>,
    body: web::Json<UploadImages>,
) -> Result<HttpResponse> {
    let images = state.gallery.upload(body.into_inner().files).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "images": images })))
}

pub async fn get_display(state: web::Data<AppState>) -> Result<HttpResponse> {
    let display = state.gallery.display().read().await?;
    Ok(HttpResponse::Ok().json(display))
}

pub async fn set_display(
    state: web::Data<AppState>,
    body: web::Json<DisplayUpdate>,
) -> Result<HttpResponse> {
    let update = body.into_inner();
    if update.url.as_deref().map_or(true, |url| url.trim().is_empty()) {
        return Err(AppError::Validation("URL is required".into()));
    }
    let display = state.gallery.display().write(update).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "displayImage": display })))
}

pub async fn toggle_creator(
    state: web::Data<AppState>,
    body: web::Json<ToggleCreator>,
) -> Result<HttpResponse> {
    let show = body
        .show_created_by
        .ok_or_else(|| AppError::Validation("showCreatedBy must be a boolean".into()))?;
    let display = state.gallery.display().toggle_creator_visibility(show).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "displayImage": display })))
}

pub async fn get_auto_display(state: web::Data<AppState>) -> Result<HttpResponse> {
    let display = state.gallery.display().read().await?;
    Ok(HttpResponse::Ok().json(json!({ "autoDisplay": display.auto_display })))
}

pub async fn toggle_auto_display(
    state: web::Data<AppState>,
    body: web::Json<ToggleAutoDisplay>,
) -> Result<HttpResponse> {
    let enabled = body
        .auto_display
        .ok_or_else(|| AppError::Validation("autoDisplay must be a boolean".into()))?;
    state.gallery.display().toggle_auto_display(enabled).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Auto-display {}", if enabled { "enabled" } else { "disabled" }),
        "autoDisplay": enabled,
    })))
}

pub async fn update_display_settings(
    state: web::Data<AppState>,
    body: web::Json<DisplaySettings>,
) -> Result<HttpResponse> {
    let display = state
        .gallery
        .display()
        .update_settings(body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "displayImage": display })))
}

pub async fn get_admin_settings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = state.gallery.settings().read().await?;
    Ok(HttpResponse::Ok().json(settings))
}

pub async fn update_admin_settings(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<HttpResponse> {
    let patch = match body.into_inner() {
        Value::Object(patch) => patch,
        _ => return Err(AppError::Validation("Settings must be a JSON object".into())),
    };
    let settings: Map<String, Value> = state.gallery.settings().update(patch).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "settings": settings })))
}

pub async fn stored_image(
    state: web::Data<AppState>,
    filename: web::Path<String>,
) -> Result<HttpResponse> {
    let filename = filename.into_inner();
    let bytes = state.gallery.images().files().read(&filename).await?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&filename))
        .body(bytes))
}
