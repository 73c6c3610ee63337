//! Test utilities for integration tests.
//!
//! Provides a router over a temporary static directory, multipart and
//! urlencoded request builders, and in-memory image fixtures.

use std::io::Cursor;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;
use tower::ServiceExt;

use resize_service::{
    create_router, ArtifactStore, ImageService, RetentionPolicy, RouterConfig, UploadPolicy,
};

pub const BOUNDARY: &str = "resize-service-test-boundary";

// =============================================================================
// Test Application
// =============================================================================

/// A router whose static directory lives in a temporary directory.
pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_service(|service| service)
    }

    pub fn with_upload_policy(policy: UploadPolicy) -> Self {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), "/static");
        let service = ImageService::new(store, policy);
        Self::from_parts(dir, service)
    }

    pub fn with_retention(retention: RetentionPolicy) -> Self {
        Self::with_service(|service| service.with_retention(retention))
    }

    fn with_service(configure: impl FnOnce(ImageService) -> ImageService) -> Self {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path(), "/static");
        let service = configure(ImageService::new(store, UploadPolicy::default()));
        Self::from_parts(dir, service)
    }

    fn from_parts(dir: TempDir, service: ImageService) -> Self {
        let router = create_router(service, RouterConfig::new().with_tracing(false));
        Self { dir, router }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_multipart(&self, uri: &str, form: MultipartForm) -> Response<Body> {
        self.send(form.into_request(uri)).await
    }

    pub async fn post_urlencoded(&self, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// File names in the static directory starting with `{prefix}_`, sorted.
    pub fn artifacts(&self, prefix: &str) -> Vec<String> {
        list_artifacts(self.dir.path(), prefix)
    }

    /// Total number of files in the static directory.
    pub fn file_count(&self) -> usize {
        std::fs::read_dir(self.dir.path()).unwrap().count()
    }

    pub fn open_artifact(&self, filename: &str) -> DynamicImage {
        image::open(self.dir.path().join(filename)).unwrap()
    }
}

pub fn list_artifacts(dir: &Path, prefix: &str) -> Vec<String> {
    let pattern = format!("{}_", prefix);
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(&pattern))
        .collect();
    names.sort();
    names
}

// =============================================================================
// Request Builders
// =============================================================================

/// Builder for a `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// =============================================================================
// Image Fixtures
// =============================================================================

/// Opaque RGB gradient encoded as JPEG.
pub fn create_rgb_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// RGBA image with a semi-transparent alpha ramp, encoded as PNG.
pub fn create_rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = 64 + ((x + y) * 128 / (width + height)) as u8;
        Rgba([
            (x * 255 / width) as u8,
            180,
            (y * 255 / height) as u8,
            alpha,
        ])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Multipart form for a resize request.
pub fn resize_form(data: &[u8], content_type: &str, width: u32, height: u32) -> MultipartForm {
    let filename = match content_type {
        "image/png" => "upload.png",
        _ => "upload.jpg",
    };
    MultipartForm::new()
        .text("width", &width.to_string())
        .text("height", &height.to_string())
        .file(filename, content_type, data)
}
