//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `POST {api}/{algorithm}/` - Resize an upload
//! - `POST {api}/{algorithm}/convert` - Convert an upload to another format
//! - `POST {api}/{algorithm}/sharpen` - Sharpen or blur a resize artifact
//! - `POST {api}/{algorithm}/enhance_image` - Denoise a resize/sharpen artifact
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ProcessError;
use crate::service::{
    ConvertRequest, ConvertResponse, EnhanceRequest, EnhanceResponse, ImageService, ResizeRequest,
    ResizeResponse, SharpenRequest, SharpenResponse, DEFAULT_RESIZE_SHARPNESS,
};

use super::extract::{AlgorithmPath, ImageForm};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image service.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ImageService>,
}

impl AppState {
    pub fn new(service: ImageService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_field", "no_source_artifact")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Same text as `message`, for clients that read `detail`
    pub detail: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        let message = message.into();
        Self {
            error: error.into(),
            detail: message.clone(),
            message,
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Status code and `error` tag for each failure kind.
pub fn error_status(err: &ProcessError) -> (StatusCode, &'static str) {
    match err {
        ProcessError::UnsupportedMediaType { .. } => {
            (StatusCode::BAD_REQUEST, "unsupported_media_type")
        }
        ProcessError::PayloadTooLarge { .. } => (StatusCode::BAD_REQUEST, "payload_too_large"),
        ProcessError::UnsupportedTargetFormat { .. } => {
            (StatusCode::BAD_REQUEST, "unsupported_target_format")
        }
        ProcessError::InvalidField { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_field"),
        ProcessError::UnknownAlgorithm(_) => (StatusCode::NOT_FOUND, "unknown_algorithm"),
        ProcessError::NoSourceArtifact { .. } => (StatusCode::NOT_FOUND, "no_source_artifact"),
        ProcessError::DecodeFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "decode_failure")
        }
        ProcessError::TransformFailure { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "transform_failure")
        }
    }
}

/// Convert ProcessError to HTTP response.
///
/// - 5xx errors are logged at ERROR level
/// - 404s at DEBUG level
/// - other 4xx errors at WARN level
impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let (status, error_type) = error_status(&self);
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle resize requests.
///
/// # Form Fields
///
/// - `file`: the image (multipart part)
/// - `width`, `height`: target size in pixels
/// - `target_format`: optional output format, defaults to the upload's
/// - `quality`: optional encode quality (1-100)
/// - `sharpness`: sharpness (-2.0..=2.0) applied after resizing, defaults to 1
pub async fn resize_handler(
    State(state): State<AppState>,
    AlgorithmPath(algorithm): AlgorithmPath,
    mut form: ImageForm,
) -> Result<Json<ResizeResponse>, ProcessError> {
    let width = form.required("width")?;
    let height = form.required("height")?;
    let target_format = form.format("target_format")?;
    let quality = form.optional("quality")?;
    let sharpness = form
        .optional("sharpness")?
        .unwrap_or(DEFAULT_RESIZE_SHARPNESS);
    let upload = form.take_file()?;

    let request = ResizeRequest {
        algorithm,
        upload,
        width,
        height,
        target_format,
        quality,
        sharpness,
    };
    state.service.resize(request).await.map(Json)
}

/// Handle convert requests.
///
/// # Form Fields
///
/// - `file`: the image (multipart part)
/// - `target_format`: output format
/// - `width`, `height`: optional, both or neither
/// - `quality`: optional encode quality (1-100)
/// - `sharpness`: optional sharpness applied after resizing
pub async fn convert_handler(
    State(state): State<AppState>,
    AlgorithmPath(algorithm): AlgorithmPath,
    mut form: ImageForm,
) -> Result<Json<ConvertResponse>, ProcessError> {
    let target_format = form
        .format("target_format")?
        .ok_or_else(|| ProcessError::invalid_field("target_format", "is required"))?;
    let size = match (form.optional("width")?, form.optional("height")?) {
        (Some(width), Some(height)) => Some((width, height)),
        (None, None) => None,
        (Some(_), None) => {
            return Err(ProcessError::invalid_field("height", "is required with width"))
        }
        (None, Some(_)) => {
            return Err(ProcessError::invalid_field("width", "is required with height"))
        }
    };
    let quality = form.optional("quality")?;
    let sharpness = form.optional("sharpness")?;
    let upload = form.take_file()?;

    let request = ConvertRequest {
        algorithm,
        upload,
        target_format,
        size,
        quality,
        sharpness,
    };
    state.service.convert(request).await.map(Json)
}

/// Handle sharpen requests.
///
/// # Form Fields
///
/// - `sharpness`: -2.0..=2.0, defaults to 0
/// - `source`: optional resize artifact file name; defaults to the newest one
pub async fn sharpen_handler(
    State(state): State<AppState>,
    AlgorithmPath(_): AlgorithmPath,
    form: ImageForm,
) -> Result<Json<SharpenResponse>, ProcessError> {
    let request = SharpenRequest {
        sharpness: form.optional("sharpness")?.unwrap_or(0.0),
        source: form.text("source").map(str::to_string),
    };
    state.service.sharpen(request).await.map(Json)
}

/// Handle enhance requests.
///
/// # Form Fields
///
/// - `noise_reduction`: 0.0..=10.0
/// - `source`: optional resize or sharpen artifact file name; defaults to the
///   newest one
pub async fn enhance_handler(
    State(state): State<AppState>,
    AlgorithmPath(_): AlgorithmPath,
    form: ImageForm,
) -> Result<Json<EnhanceResponse>, ProcessError> {
    let request = EnhanceRequest {
        noise_reduction: form.required("noise_reduction")?,
        source: form.text("source").map(str::to_string),
    };
    state.service.enhance(request).await.map(Json)
}

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
