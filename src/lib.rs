//! # Resize Service
//!
//! An HTTP service that resizes, converts, sharpens and denoises uploaded
//! images, writes each result to a static directory and keeps only the newest
//! few results of each kind.
//!
//! ## Features
//!
//! - **Three interpolation kernels**: nearest, bilinear and bicubic, chosen by path
//! - **Five output formats**: JPEG, PNG, WEBP, BMP and TIFF, with one shared
//!   colour-mode coercion table
//! - **Chained operations**: sharpen and enhance work on an earlier artifact,
//!   named explicitly or found as the newest of its kind
//! - **Bounded disk use**: per-family retention after every write
//!
//! ## Architecture
//!
//! - [`upload`] - Content type and size admission
//! - [`imaging`] - Formats, coercion, codecs and filters
//! - [`artifact`] - Artifact names, storage and retention
//! - [`service`] - The per-request pipeline
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use resize_service::{create_router, ArtifactStore, ImageService, RouterConfig, UploadPolicy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = ArtifactStore::new("static", "/static");
//!     store.ensure_dir().unwrap();
//!
//!     let service = ImageService::new(store, UploadPolicy::default());
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod imaging;
pub mod server;
pub mod service;
pub mod upload;

// Re-export commonly used types
pub use artifact::{ArtifactFamily, ArtifactName, ArtifactStore, PruneReport};
pub use config::{Cli, Command, PruneConfig, ServeConfig};
pub use error::ProcessError;
pub use imaging::{Algorithm, ColorMode, Coercion, OutputFormat, SharpenParams};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use service::{
    ConvertRequest, ConvertResponse, EnhanceRequest, EnhanceResponse, ImageService, ResizeRequest,
    ResizeResponse, RetentionPolicy, SharpenRequest, SharpenResponse, DEFAULT_RESIZE_SHARPNESS,
};
pub use upload::{UploadPolicy, UploadedImage, ValidatedUpload};
