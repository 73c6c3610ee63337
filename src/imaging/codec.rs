//! Decoding uploads and encoding artifacts.
//!
//! # Design Decisions
//!
//! - **Format sniffing**: uploads are decoded from their magic bytes, not from
//!   the declared content type. The declared type only gates admission.
//!
//! - **Per-format save parameters**: JPEG and WEBP honour the requested
//!   quality (WEBP through libwebp's lossy encoder), PNG uses default
//!   compression with adaptive filtering, BMP and TIFF use their plain
//!   encoders.
//!
//! - **Coercion first**: callers must run the image through the coercion
//!   policy before encoding. Encoding a mode the format cannot hold is
//!   reported as a transform failure, never silently converted here.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, ImageReader};

use crate::error::ProcessError;

use super::format::OutputFormat;

/// Default encode quality (1-100).
pub const DEFAULT_QUALITY: u8 = 85;

/// Minimum allowed quality.
pub const MIN_QUALITY: u8 = 1;

/// Maximum allowed quality.
pub const MAX_QUALITY: u8 = 100;

// =============================================================================
// Decode
// =============================================================================

/// Decode an image, detecting its format from the content.
pub fn decode(source: &[u8]) -> Result<DynamicImage, ProcessError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| ProcessError::DecodeFailure {
            message: e.to_string(),
        })?;

    reader.decode().map_err(|e| ProcessError::DecodeFailure {
        message: e.to_string(),
    })
}

// =============================================================================
// Encode
// =============================================================================

/// Encode an image in the given format.
///
/// `quality` only affects lossy formats and is clamped to 1-100.
///
/// # Errors
///
/// Returns [`ProcessError::TransformFailure`] if the encoder rejects the
/// image, e.g. because its colour mode was not coerced for `format`.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Bytes, ProcessError> {
    let mut output = Vec::new();

    let result = match format {
        OutputFormat::Jpeg => image.write_with_encoder(JpegEncoder::new_with_quality(
            &mut output,
            clamp_quality(quality),
        )),
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
            &mut output,
            CompressionType::Default,
            PngFilterType::Adaptive,
        )),
        OutputFormat::Webp => return encode_webp(image, quality),
        OutputFormat::Bmp => image.write_with_encoder(BmpEncoder::new(&mut output)),
        OutputFormat::Tiff => {
            image.write_with_encoder(TiffEncoder::new(Cursor::new(&mut output)))
        }
    };

    result.map_err(|e| ProcessError::transform(format!("failed to encode {}: {}", format, e)))?;

    Ok(Bytes::from(output))
}

/// Lossy WEBP at `quality`, keeping the alpha channel when there is one.
fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Bytes, ProcessError> {
    let (width, height) = (image.width(), image.height());
    let quality = f32::from(clamp_quality(quality));

    let encoded = if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        webp::Encoder::from_rgba(&rgba, width, height).encode_simple(false, quality)
    } else {
        let rgb = image.to_rgb8();
        webp::Encoder::from_rgb(&rgb, width, height).encode_simple(false, quality)
    };

    encoded
        .map(|memory| Bytes::copy_from_slice(&memory))
        .map_err(|e| ProcessError::transform(format!("failed to encode webp: {:?}", e)))
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Whether any pixel of the image is not fully opaque.
pub fn has_transparency(image: &DynamicImage) -> bool {
    if !image.color().has_alpha() {
        return false;
    }
    image.to_rgba8().pixels().any(|p| p[3] < u8::MAX)
}

/// Validate a quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_QUALITY..=MAX_QUALITY).contains(&quality)
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
