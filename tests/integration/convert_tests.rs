//! Convert endpoint tests.

use axum::http::StatusCode;
use image::{ColorType, GenericImageView};

use super::test_utils::{create_rgb_jpeg, create_rgba_png, json_body, MultipartForm, TestApp};

#[tokio::test]
async fn test_convert_png_to_webp_keeps_size() {
    let app = TestApp::new();
    let png = create_rgba_png(48, 32);

    let form = MultipartForm::new()
        .text("target_format", "webp")
        .file("logo.png", "image/png", &png);
    let response = app.post_multipart("/api/resize/nearest/convert", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["format"], "webp");
    assert_eq!(json["source_extension"], "png");
    assert_eq!(json["quality"], 85);
    assert_eq!(json["width"], 48);
    assert_eq!(json["height"], 32);
    assert_eq!(json["has_transparency"], true);

    let filename = json["filename"].as_str().unwrap();
    assert!(filename.starts_with("converted_48x32_"));
    assert!(filename.ends_with(".webp"));
    assert_eq!(app.open_artifact(filename).dimensions(), (48, 32));
}

#[tokio::test]
async fn test_convert_with_resize() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(80, 80);

    let form = MultipartForm::new()
        .text("target_format", "png")
        .text("width", "20")
        .text("height", "10")
        .text("quality", "70")
        .file("photo.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/bicubic/convert", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["quality"], 70);
    assert_eq!(json["algorithm"], "bicubic");
    assert_eq!(
        app.open_artifact(json["filename"].as_str().unwrap())
            .dimensions(),
        (20, 10)
    );
}

#[tokio::test]
async fn test_convert_rgba_to_bmp_flattens() {
    let app = TestApp::new();
    let png = create_rgba_png(16, 16);

    let form = MultipartForm::new()
        .text("target_format", "bmp")
        .file("logo.png", "image/png", &png);
    let response = app.post_multipart("/api/resize/nearest/convert", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["final_mode"], "RGB");
    let artifact = app.open_artifact(json["filename"].as_str().unwrap());
    assert_eq!(artifact.color(), ColorType::Rgb8);
}

#[tokio::test]
async fn test_convert_to_tiff() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(12, 12);

    let form = MultipartForm::new()
        .text("target_format", "tif")
        .file("photo.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/bilinear/convert", form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["format"], "tiff");
    assert!(json["filename"].as_str().unwrap().ends_with(".tiff"));
}

#[tokio::test]
async fn test_convert_requires_target_format() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(12, 12);

    let form = MultipartForm::new().file("photo.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/convert", form).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(response).await;
    assert!(json["message"].as_str().unwrap().contains("target_format"));
}

#[tokio::test]
async fn test_convert_width_without_height() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(12, 12);

    let form = MultipartForm::new()
        .text("target_format", "png")
        .text("width", "6")
        .file("photo.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/convert", form).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_convert_quality_out_of_range() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(12, 12);

    for quality in ["0", "101", "300", "high"] {
        let form = MultipartForm::new()
            .text("target_format", "jpg")
            .text("quality", quality)
            .file("photo.jpg", "image/jpeg", &jpeg);
        let response = app.post_multipart("/api/resize/nearest/convert", form).await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "quality={}",
            quality
        );
    }
    assert_eq!(app.file_count(), 0);
}

#[tokio::test]
async fn test_convert_unsupported_format() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(12, 12);

    let form = MultipartForm::new()
        .text("target_format", "heic")
        .file("photo.jpg", "image/jpeg", &jpeg);
    let response = app.post_multipart("/api/resize/nearest/convert", form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
