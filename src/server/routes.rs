//! Router configuration for the image service.
//!
//! # Route Structure
//!
//! ```text
//! /health                                   - Health check
//! {api}/{algorithm}  {api}/{algorithm}/     - Resize
//! {api}/{algorithm}/convert                 - Convert
//! {api}/{algorithm}/sharpen                 - Sharpen / blur an artifact
//! {api}/{algorithm}/enhance_image           - Denoise an artifact
//! {static}/{filename}                       - Saved artifacts
//! ```
//!
//! `{api}` defaults to `/api/resize` and `{static}` to `/static`.
//!
//! # Example
//!
//! ```ignore
//! use resize_service::artifact::ArtifactStore;
//! use resize_service::server::{create_router, RouterConfig};
//! use resize_service::service::ImageService;
//! use resize_service::upload::UploadPolicy;
//!
//! let service = ImageService::new(ArtifactStore::new("static", "/static"), UploadPolicy::default());
//! let router = create_router(service, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    convert_handler, enhance_handler, health_handler, resize_handler, sharpen_handler, AppState,
};
use crate::service::ImageService;

/// Default mount point of the image API.
pub const DEFAULT_API_PREFIX: &str = "/api/resize";

/// Default mount point of the static directory.
pub const DEFAULT_STATIC_URL_PREFIX: &str = "/static";

/// Room left in the request body limit for multipart boundaries and the
/// non-file form fields.
pub const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Path the image API is mounted under
    pub api_prefix: String,

    /// Path the static directory is served under
    pub static_url_prefix: String,

    /// Whether to serve the static directory at all
    pub serve_static: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - The API is mounted at `/api/resize` and artifacts at `/static`
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            static_url_prefix: DEFAULT_STATIC_URL_PREFIX.to_string(),
            serve_static: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn with_static_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_url_prefix = prefix.into();
        self
    }

    /// Enable or disable serving the static directory.
    pub fn with_static_serving(mut self, enabled: bool) -> Self {
        self.serve_static = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The body limit for the API routes is the service's upload cap plus
/// [`FORM_OVERHEAD_BYTES`]; the static directory served is the service's
/// artifact store.
pub fn create_router(service: ImageService, config: RouterConfig) -> Router {
    let body_limit = service
        .upload_policy()
        .max_bytes()
        .saturating_add(FORM_OVERHEAD_BYTES);
    let static_dir = service.store().root().to_path_buf();
    let app_state = AppState::new(service);

    let api_routes = Router::new()
        .route("/{algorithm}", post(resize_handler))
        .route("/{algorithm}/", post(resize_handler))
        .route("/{algorithm}/convert", post(convert_handler))
        .route("/{algorithm}/sharpen", post(sharpen_handler))
        .route("/{algorithm}/enhance_image", post(enhance_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state);

    let router = Router::new().route("/health", get(health_handler));

    let router = match normalize_prefix(&config.api_prefix) {
        Some(prefix) => router.nest(&prefix, api_routes),
        None => router.merge(api_routes),
    };

    let router = if config.serve_static {
        let serve_dir = ServeDir::new(static_dir);
        match normalize_prefix(&config.static_url_prefix) {
            Some(prefix) => router.nest_service(&prefix, serve_dir),
            None => router.fallback_service(serve_dir),
        }
    } else {
        router
    };

    let router = router.layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// `/api/resize/` → `/api/resize`; `/` and `` → None (mount at the root).
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
