//! Imaging layer.
//!
//! Everything that touches pixels goes through this module: choosing an
//! output format, coercing colour modes so the chosen encoder accepts them,
//! and the resize/sharpen/denoise operations themselves.
//!
//! # Pipeline
//!
//! ```text
//! bytes ──decode──▶ DynamicImage ──filters──▶ DynamicImage
//!                                                  │
//!                                     coerce(mode, format)
//!                                                  │
//!                                                  ▼
//!                                   encode(format, quality) ──▶ bytes
//! ```

mod codec;
mod coercion;
mod filters;
mod format;

pub use codec::{
    clamp_quality, decode, encode, has_transparency, is_valid_quality, DEFAULT_QUALITY,
    MAX_QUALITY, MIN_QUALITY,
};
pub use coercion::{apply, coerce, coerce_image, Coercion, ColorMode};
pub use filters::{
    denoise, median_radius, resize, sharpen, Algorithm, SharpenParams, NOISE_REDUCTION_RANGE,
    SHARPNESS_RANGE,
};
pub use format::OutputFormat;
