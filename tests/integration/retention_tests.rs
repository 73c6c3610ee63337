//! Retention tests: only the newest artifacts of each family survive.

use axum::http::StatusCode;

use resize_service::RetentionPolicy;

use super::test_utils::{create_rgb_jpeg, json_body, resize_form, MultipartForm, TestApp};

#[tokio::test]
async fn test_resize_keeps_only_newest() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(40, 40);

    let mut last = String::new();
    for size in [10, 11, 12, 13] {
        let response = app
            .post_multipart(
                "/api/resize/nearest/",
                resize_form(&jpeg, "image/jpeg", size, size),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        last = json_body(response).await["filename"]
            .as_str()
            .unwrap()
            .to_string();
    }

    assert_eq!(app.artifacts("resize"), vec![last]);
}

#[tokio::test]
async fn test_sharpen_keeps_three_and_leaves_resize_alone() {
    let app = TestApp::new();
    let jpeg = create_rgb_jpeg(20, 20);
    app.post_multipart(
        "/api/resize/nearest/",
        resize_form(&jpeg, "image/jpeg", 16, 16),
    )
    .await;

    let mut produced = Vec::new();
    for sharpness in ["-2", "-1", "0.5", "1", "2"] {
        let response = app
            .post_urlencoded(
                "/api/resize/nearest/sharpen",
                &format!("sharpness={}", sharpness),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        produced.push(
            json_body(response).await["filename"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }

    let mut expected = produced[2..].to_vec();
    expected.sort();
    assert_eq!(app.artifacts("sharpen"), expected);
    assert_eq!(app.artifacts("resize").len(), 1);
}

#[tokio::test]
async fn test_custom_retention() {
    let app = TestApp::with_retention(RetentionPolicy {
        resize: 1,
        converted: 2,
        sharpen: 3,
        enhanced: 3,
    });
    let jpeg = create_rgb_jpeg(20, 20);

    for format in ["png", "bmp", "tiff"] {
        let form = MultipartForm::new()
            .text("target_format", format)
            .file("photo.jpg", "image/jpeg", &jpeg);
        let response = app.post_multipart("/api/resize/nearest/convert", form).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let converted = app.artifacts("converted");
    assert_eq!(converted.len(), 2);
    assert!(converted.iter().all(|name| !name.ends_with(".png")));
}
