#![cfg(feature = "server")]

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use promptcanvas::{
    models::{GeneratedImage, ImageGenerationResponse, Questionnaire},
    server::{configure, AppState},
    storage::ImageFileStore,
    AppError, Gallery, ImageGenerator, StorageManager,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const QUESTIONS: &str = r#"[
    {"id": 1, "question": "Your name?", "type": "free-text",
     "promptTemplate": "${answer}", "required": false, "excludeFromPrompt": true},
    {"id": 2, "question": "What weather?", "type": "free-text",
     "promptTemplate": "A ${answer} scene", "required": true, "excludeFromPrompt": false},
    {"id": 3, "question": "Which animal?", "type": "select",
     "options": {"fox": "a red fox", "owl": "a snowy owl"},
     "promptTemplate": "with ${answer}", "required": false, "excludeFromPrompt": false}
]"#;

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

#[async_trait]
impl ImageGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> promptcanvas::Result<ImageGenerationResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(message) = &self.fail_with {
            return Err(AppError::ExternalService(message.clone()));
        }
        Ok(ImageGenerationResponse {
            image: GeneratedImage::Base64(STANDARD.encode(b"fake-png")),
            revised_prompt: None,
            model: "test".to_string(),
        })
    }

    async fn download(&self, _url: &str) -> promptcanvas::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

struct Harness {
    state: web::Data<AppState>,
    generator: Arc<RecordingGenerator>,
    _dir: tempfile::TempDir,
}

async fn harness_with(generator: RecordingGenerator, base_path: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let files = ImageFileStore::new(dir.path().join("stored-images"))
        .await
        .unwrap();
    let generator = Arc::new(generator);
    let gallery = Gallery::new(StorageManager::memory(), files, generator.clone());
    let questionnaire = Questionnaire::from_json(QUESTIONS).unwrap();
    Harness {
        state: web::Data::new(AppState::new(gallery, questionnaire, base_path)),
        generator,
        _dir: dir,
    }
}

async fn harness() -> Harness {
    harness_with(RecordingGenerator::default(), "").await
}

macro_rules! app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .app_data($harness.state.clone())
                .configure(configure(&$harness.state.base_path)),
        )
        .await
    };
}

#[actix_web::test]
async fn questions_are_listed_with_options() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::get().uri("/api/questions").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body.as_array().unwrap().len(), 3);
    assert_eq!(body[2]["options"]["owl"], json!("a snowy owl"));
    assert_eq!(body[1]["promptTemplate"], json!("A ${answer} scene"));
}

#[actix_web::test]
async fn answers_generate_store_and_display_an_image() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/questions/generate")
        .set_json(json!({"answers": {"question-1": "Alice", "question-2": "snowy", "question-3": "owl"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    let image_url = body["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/stored-images/image-"));

    assert_eq!(
        *h.generator.prompts.lock().unwrap(),
        vec!["A snowy scene with a snowy owl".to_string()]
    );

    let req = test::TestRequest::get().uri("/api/images").to_request();
    let images: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(images[0]["createdBy"], json!("Alice"));
    assert_eq!(images[0]["prompt"], json!("A snowy scene with a snowy owl"));

    let req = test::TestRequest::get().uri("/api/images/display").to_request();
    let display: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(display["url"], json!(image_url));
    assert_eq!(display["createdBy"], json!("Alice"));

    let req = test::TestRequest::get().uri(&image_url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/png"
    );
    assert_eq!(test::read_body(resp).await.as_ref(), b"fake-png");
}

#[actix_web::test]
async fn missing_required_answer_is_a_bad_request() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/questions/generate")
        .set_json(json!({"answers": {"question-1": "Alice"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert!(h.generator.prompts.lock().unwrap().is_empty());

    let req = test::TestRequest::post()
        .uri("/api/questions/generate")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn external_failures_map_to_bad_gateway() {
    let generator = RecordingGenerator {
        fail_with: Some("content policy violation".to_string()),
        ..Default::default()
    };
    let h = harness_with(generator, "").await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/images/generate")
        .set_json(json!({"prompt": "a castle", "createdBy": "Bob"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("content policy violation"));
}

#[actix_web::test]
async fn delete_clears_display_and_unknown_is_not_found() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/images/generate")
        .set_json(json!({"prompt": "a castle", "createdBy": "Bob"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let url = body["url"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/images/delete")
        .set_json(json!({"imageUrl": "/stored-images/missing.png"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/images/delete")
        .set_json(json!({"imageUrl": url}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/images/display").to_request();
    let display: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(display["url"], json!(""));
    assert_eq!(display["createdBy"], json!(""));
    assert_eq!(display["showCreatedBy"], json!(true));

    let req = test::TestRequest::get().uri(&url).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn auto_display_toggle_controls_promotion() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/images/display/toggle-auto-display")
        .set_json(json!({"autoDisplay": false}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["autoDisplay"], json!(false));

    let req = test::TestRequest::post()
        .uri("/api/images/generate")
        .set_json(json!({"prompt": "a castle", "createdBy": "Bob"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["displayed"], json!(false));

    let req = test::TestRequest::get()
        .uri("/api/images/display/auto-display")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"autoDisplay": false}));

    let req = test::TestRequest::get().uri("/api/images/display").to_request();
    let display: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(display["url"], json!(""));
}

#[actix_web::test]
async fn display_write_and_toggles() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/images/display")
        .set_json(json!({"createdBy": "nobody"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/images/display")
        .set_json(json!({"url": "/stored-images/a.png", "createdBy": "Cleo"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["displayImage"]["showCreatedBy"], json!(true));

    let req = test::TestRequest::post()
        .uri("/api/images/display/toggle-creator")
        .set_json(json!({"showCreatedBy": "yes"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/images/display/toggle-creator")
        .set_json(json!({"showCreatedBy": false}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["displayImage"]["showCreatedBy"], json!(false));
    assert_eq!(body["displayImage"]["createdBy"], json!("Cleo"));

    let req = test::TestRequest::post()
        .uri("/api/images/display/settings")
        .set_json(json!({"showDetails": true}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["displayImage"]["showDetails"], json!(true));
    assert_eq!(body["displayImage"]["showCreatedBy"], json!(false));
}

#[actix_web::test]
async fn upload_reorder_and_update_answer() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/images/upload")
        .set_json(json!({"files": [
            {"filename": "one.png", "data": STANDARD.encode(b"1")},
            {"filename": "two.png", "data": STANDARD.encode(b"2")}
        ]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["images"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/images").to_request();
    let mut images: Value = test::call_and_read_body_json(&app, req).await;
    let first_url = images[0]["url"].as_str().unwrap().to_string();
    images.as_array_mut().unwrap().reverse();

    let req = test::TestRequest::post()
        .uri("/api/images/reorder")
        .set_json(json!({ "images": images }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/images").to_request();
    let reordered: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(reordered[1]["url"], json!(first_url));

    let mut with_gap = reordered.as_array().unwrap().clone();
    with_gap.insert(1, Value::Null);
    let req = test::TestRequest::post()
        .uri("/api/images/reorder")
        .set_json(json!({ "images": with_gap }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = test::TestRequest::get().uri("/api/images").to_request();
    let after_gap: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(after_gap, reordered);

    for payload in [json!({"images": []}), json!({"images": [null]}), json!({"images": [{"timestamp": "2024-12-01T10:00:00Z"}]})] {
        let req = test::TestRequest::post()
            .uri("/api/images/reorder")
            .set_json(payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::post()
        .uri("/api/images/update-answer")
        .set_json(json!({"url": first_url, "answer": "Dana"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["image"]["createdBy"], json!("Dana"));

    let req = test::TestRequest::post()
        .uri("/api/images/update-answer")
        .set_json(json!({"url": "/stored-images/ghost.png", "answer": "x"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_settings_merge() {
    let h = harness().await;
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/admin/settings")
        .set_json(json!({"title": "Winter Fair"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["settings"]["title"], json!("Winter Fair"));

    let req = test::TestRequest::get().uri("/api/admin/settings").to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings["title"], json!("Winter Fair"));
    assert_eq!(settings["autoDisplayNew"], json!(false));
}

#[actix_web::test]
async fn routes_live_under_base_path() {
    let h = harness_with(RecordingGenerator::default(), "/christmas").await;
    let app = app!(h);

    let req = test::TestRequest::get().uri("/christmas/api/config").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"basePath": "/christmas"}));

    let req = test::TestRequest::get().uri("/api/config").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/christmas/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["healthy"], json!(true));
}
