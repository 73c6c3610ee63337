//! Image service.
//!
//! The service turns validated requests into saved artifacts. It owns the
//! artifact store, the upload policy and the retention counts; the HTTP layer
//! only parses forms and maps errors.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          ImageService                            │
//! │                                                                  │
//! │  resize / convert            sharpen / enhance                   │
//! │  ┌──────────────────┐        ┌──────────────────────────────┐    │
//! │  │ validate upload  │        │ resolve `source` or latest   │    │
//! │  │ decode           │        │ decode, coerce to own format │    │
//! │  │ coerce, resize   │        │ blur / unsharp / median      │    │
//! │  │ sharpen          │        │                              │    │
//! │  └────────┬─────────┘        └──────────────┬───────────────┘    │
//! │           └──────────────┬──────────────────┘                    │
//! │                          ▼                                       │
//! │              encode → name → write → prune                       │
//! │                          │                                       │
//! │                          ▼                                       │
//! │                   ┌──────────────┐                               │
//! │                   │ArtifactStore │                               │
//! │                   └──────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

mod image_service;
mod types;

pub use image_service::{ImageService, DEFAULT_CACHE_CONTROL, MAX_DIMENSION};
pub use types::{
    ConvertRequest, ConvertResponse, EnhanceRequest, EnhanceResponse, ResizeRequest,
    ResizeResponse, RetentionPolicy, SharpenRequest, SharpenResponse, DEFAULT_RESIZE_SHARPNESS,
};
