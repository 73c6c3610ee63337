//! Resize endpoint tests.
//!
//! Tests verify:
//! - Resizing keeps the upload's format unless another is requested
//! - Alpha is flattened onto white for formats without transparency
//! - Every algorithm produces exactly the requested dimensions
//! - Error cases map to the documented status codes

use axum::http::StatusCode;
use image::{ColorType, GenericImageView};

use super::test_utils::{create_rgb_jpeg, create_rgba_png, json_body, resize_form, TestApp};

// =============================================================================
// Successful Resizes
// =============================================================================

#[tokio::test]
async fn test_resize_jpeg_keeps_extension() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(100, 100);

    let response = app
        .post_multipart(
            "/api/resize/nearest/",
            resize_form(&jpeg, "image/jpeg", 50, 50),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["used_extension"], "jpg");
    assert_eq!(json["source_extension"], "jpg");
    assert_eq!(json["algorithm"], "nearest");
    assert_eq!(json["width"], 50);
    assert_eq!(json["height"], 50);
    assert_eq!(json["sharpness_applied"], 1.0);
    assert_eq!(
        json["cache_control"],
        "public, max-age=600, stale-while-revalidate=3600"
    );

    let filename = json["filename"].as_str().unwrap();
    assert_eq!(json["url"], format!("/static/{}", filename));
    assert!(filename.starts_with("resize_50x50_"));
    assert!(filename.ends_with(".jpg"));
    assert_eq!(app.open_artifact(filename).dimensions(), (50, 50));
}

#[tokio::test]
async fn test_resize_rgba_png_to_jpeg_flattens_alpha() {
    let app = TestApp::new();
    let png = create_rgba_png(200, 200);

    let form = resize_form(&png, "image/png", 64, 64).text("target_format", "jpg");
    let response = app.post_multipart("/api/resize/bicubic/", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["used_extension"], "jpg");
    assert_eq!(json["source_extension"], "png");
    assert_eq!(json["original_mode"], "RGBA");
    assert_eq!(json["final_mode"], "RGB");
    assert_eq!(json["has_transparency"], false);

    let artifact = app.open_artifact(json["filename"].as_str().unwrap());
    assert_eq!(artifact.color(), ColorType::Rgb8);
    assert_eq!(artifact.dimensions(), (64, 64));
}

#[tokio::test]
async fn test_resize_rgba_png_keeps_transparency() {
    let app = TestApp::new();
    let png = create_rgba_png(40, 40);

    let response = app
        .post_multipart("/api/resize/bilinear/", resize_form(&png, "image/png", 20, 20))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["used_extension"], "png");
    assert_eq!(json["final_mode"], "RGBA");
    assert_eq!(json["has_transparency"], true);
}

#[tokio::test]
async fn test_every_algorithm_produces_requested_size() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(90, 60);

    for algorithm in ["nearest", "bilinear", "bicubic"] {
        let response = app
            .post_multipart(
                &format!("/api/resize/{}/", algorithm),
                resize_form(&jpeg, "image/jpeg", 37, 23),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "{}", algorithm);

        let json = json_body(response).await;
        let artifact = app.open_artifact(json["filename"].as_str().unwrap());
        assert_eq!(artifact.dimensions(), (37, 23), "{}", algorithm);
    }
}

#[tokio::test]
async fn test_resize_without_trailing_slash() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let response = app
        .post_multipart("/api/resize/bicubic", resize_form(&jpeg, "image/jpeg", 10, 10))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_resize_with_sharpness() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(40, 40);

    let form = resize_form(&jpeg, "image/jpeg", 30, 30).text("sharpness", "1.5");
    let response = app.post_multipart("/api/resize/bilinear/", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["sharpness_applied"], 1.5);
}

#[tokio::test]
async fn test_resize_target_format_case_insensitive() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let form = resize_form(&jpeg, "image/jpeg", 10, 10).text("target_format", "PNG");
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["used_extension"], "png");
    assert!(json["filename"].as_str().unwrap().ends_with(".png"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_unknown_algorithm() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let response = app
        .post_multipart("/api/resize/lanczos/", resize_form(&jpeg, "image/jpeg", 10, 10))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = json_body(response).await;
    assert_eq!(json["error"], "unknown_algorithm");
    assert_eq!(app.file_count(), 0);
}

#[tokio::test]
async fn test_unsupported_target_format() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let form = resize_form(&jpeg, "image/jpeg", 10, 10).text("target_format", "gif");
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"], "unsupported_target_format");
    assert_eq!(json["status"], 400);
    assert!(json["detail"].as_str().unwrap().contains("gif"));
}

#[tokio::test]
async fn test_missing_dimension() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    let form = super::test_utils::MultipartForm::new()
        .text("width", "10")
        .file("a.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    assert_eq!(json["error"], "invalid_field");
    assert!(json["message"].as_str().unwrap().contains("height"));
}

#[tokio::test]
async fn test_zero_and_oversized_dimensions() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);

    for (width, height) in [(0, 10), (10, 20_000)] {
        let response = app
            .post_multipart(
                "/api/resize/nearest/",
                resize_form(&jpeg, "image/jpeg", width, height),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "{}x{}",
            width,
            height
        );
    }
    assert_eq!(app.file_count(), 0);
}

#[tokio::test]
async fn test_missing_file() {
    let app = TestApp::new();
    let form = super::test_utils::MultipartForm::new()
        .text("width", "10")
        .text("height", "10");

    let response = app.post_multipart("/api/resize/nearest/", form).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_undecodable_upload() {
    let app = TestApp::new();

    let response = app
        .post_multipart(
            "/api/resize/nearest/",
            resize_form(b"not really a png", "image/png", 10, 10),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(response).await;
    assert_eq!(json["error"], "decode_failure");
    assert_eq!(app.file_count(), 0);
}
