//! Upload admission tests.
//!
//! Tests verify:
//! - Content types outside the allow-list are rejected before decoding
//! - Uploads above the size cap are rejected
//! - Extension inference is opt-in

use axum::http::StatusCode;

use resize_service::UploadPolicy;

use super::test_utils::{create_rgb_jpeg, json_body, resize_form, MultipartForm, TestApp};

#[tokio::test]
async fn test_text_plain_rejected() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let form = MultipartForm::new()
        .text("width", "10")
        .text("height", "10")
        .file("notes.txt", "text/plain", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "unsupported_media_type");
    assert!(json["message"].as_str().unwrap().contains("text/plain"));
    assert_eq!(app.file_count(), 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = TestApp::new();
    let payload = vec![0u8; 11 * 1024 * 1024];

    let response = app
        .post_multipart(
            "/api/resize/nearest/",
            resize_form(&payload, "image/jpeg", 10, 10),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "payload_too_large");
    assert_eq!(app.file_count(), 0);
}

#[tokio::test]
async fn test_custom_upload_cap() {
    let app = TestApp::with_upload_policy(UploadPolicy::new(1024));
    let jpeg = create_rgb_jpeg(64, 64);
    assert!(jpeg.len() > 1024);

    let response = app
        .post_multipart("/api/resize/nearest/", resize_form(&jpeg, "image/jpeg", 8, 8))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "payload_too_large");
}

#[tokio::test]
async fn test_content_type_parameters_ignored() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let response = app
        .post_multipart(
            "/api/resize/nearest/",
            resize_form(&jpeg, "Image/JPEG; charset=binary", 10, 10),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_extension_inference_disabled_by_default() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let form = MultipartForm::new()
        .text("width", "10")
        .text("height", "10")
        .file("photo.jpg", "application/octet-stream", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extension_inference_enabled() {
    let app = TestApp::with_upload_policy(UploadPolicy::default().with_extension_inference(true));
    let jpeg = create_rgb_jpeg(20, 20);

    let form = MultipartForm::new()
        .text("width", "10")
        .text("height", "10")
        .file("photo.jpg", "application/octet-stream", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["source_extension"], "jpg");
}

#[tokio::test]
async fn test_non_form_body_rejected() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/resize/nearest/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{}"))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
