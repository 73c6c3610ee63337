//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        POST {api}/{algorithm}/[convert|sharpen|enhance_image]   │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │  extract    │  │    handlers      │  │     routes       │    │
//! │  │ (forms)     │  │ (errors → JSON)  │  │ (CORS, static)   │    │
//! │  └─────────────┘  └──────────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{AlgorithmPath, ImageForm, FILE_FIELD};
pub use handlers::{
    convert_handler, enhance_handler, error_status, health_handler, resize_handler,
    sharpen_handler, AppState, ErrorResponse, HealthResponse,
};
pub use routes::{
    create_router, RouterConfig, DEFAULT_API_PREFIX, DEFAULT_STATIC_URL_PREFIX,
    FORM_OVERHEAD_BYTES,
};
