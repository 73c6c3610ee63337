//! Request and response types for the image service.

use serde::Serialize;

use crate::artifact::ArtifactFamily;
use crate::imaging::{Algorithm, OutputFormat, SharpenParams};
use crate::upload::UploadedImage;

// =============================================================================
// Requests
// =============================================================================

/// Sharpness applied by a resize when the caller does not choose one.
pub const DEFAULT_RESIZE_SHARPNESS: f32 = 1.0;

/// Resize an uploaded image, optionally re-encoding it in another format.
#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub algorithm: Algorithm,
    pub upload: UploadedImage,

    /// Target width in pixels
    pub width: u32,

    /// Target height in pixels
    pub height: u32,

    /// Output format; defaults to the upload's own format
    pub target_format: Option<OutputFormat>,

    /// Encode quality (1-100) for lossy formats
    pub quality: Option<u8>,

    /// Sharpness (-2.0..=2.0) applied after resizing, 0 for none
    pub sharpness: f32,
}

impl ResizeRequest {
    pub fn new(algorithm: Algorithm, upload: UploadedImage, width: u32, height: u32) -> Self {
        Self {
            algorithm,
            upload,
            width,
            height,
            target_format: None,
            quality: None,
            sharpness: DEFAULT_RESIZE_SHARPNESS,
        }
    }

    pub fn with_target_format(mut self, format: OutputFormat) -> Self {
        self.target_format = Some(format);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_sharpness(mut self, sharpness: f32) -> Self {
        self.sharpness = sharpness;
        self
    }
}

/// Convert an uploaded image to another format, optionally resizing it.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub algorithm: Algorithm,
    pub upload: UploadedImage,
    pub target_format: OutputFormat,

    /// Resize to `(width, height)` before encoding
    pub size: Option<(u32, u32)>,

    pub quality: Option<u8>,
    pub sharpness: Option<f32>,
}

impl ConvertRequest {
    pub fn new(algorithm: Algorithm, upload: UploadedImage, target_format: OutputFormat) -> Self {
        Self {
            algorithm,
            upload,
            target_format,
            size: None,
            quality: None,
            sharpness: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_sharpness(mut self, sharpness: f32) -> Self {
        self.sharpness = Some(sharpness);
        self
    }
}

/// Sharpen or blur a previously produced resize artifact.
#[derive(Debug, Clone)]
pub struct SharpenRequest {
    /// -2.0..=2.0; negative blurs, positive sharpens, zero copies
    pub sharpness: f32,

    /// Artifact to operate on. When absent the newest resize artifact is used.
    pub source: Option<String>,
}

/// Denoise a previously produced resize or sharpen artifact.
#[derive(Debug, Clone)]
pub struct EnhanceRequest {
    /// 0.0..=10.0; mapped to a median filter radius
    pub noise_reduction: f32,

    /// Artifact to operate on. When absent the newest resize or sharpen
    /// artifact is used.
    pub source: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Response to a resize request.
#[derive(Debug, Clone, Serialize)]
pub struct ResizeResponse {
    pub filename: String,
    pub url: String,
    pub cache_control: String,
    pub source_extension: String,
    pub used_extension: String,
    pub algorithm: Algorithm,
    pub width: u32,
    pub height: u32,
    pub sharpness_applied: f32,
    pub original_mode: String,
    pub final_mode: String,
    pub has_transparency: bool,
}

/// Response to a convert request.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResponse {
    pub filename: String,
    pub url: String,
    pub cache_control: String,
    pub source_extension: String,
    pub format: String,
    pub algorithm: Algorithm,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub sharpness_applied: Option<f32>,
    pub original_mode: String,
    pub final_mode: String,
    pub has_transparency: bool,
}

/// Response to a sharpen request.
#[derive(Debug, Clone, Serialize)]
pub struct SharpenResponse {
    pub filename: String,
    pub url: String,
    pub cache_control: String,
    pub extension: String,
    pub sharpness: f32,
    pub source_filename: String,
    pub has_alpha: bool,
    pub image_mode: String,
    pub params: SharpenParams,
}

/// Response to an enhance request.
#[derive(Debug, Clone, Serialize)]
pub struct EnhanceResponse {
    pub filename: String,
    pub url: String,
    pub cache_control: String,
    pub extension: String,
    pub noise_reduction: f32,
    pub source_filename: String,
    pub median_radius: u32,
    pub has_alpha: bool,
    pub image_mode: String,
}

// =============================================================================
// Retention
// =============================================================================

/// How many artifacts of each family survive a prune pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub resize: usize,
    pub converted: usize,
    pub sharpen: usize,
    pub enhanced: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            resize: 1,
            converted: 1,
            sharpen: 3,
            enhanced: 3,
        }
    }
}

impl RetentionPolicy {
    pub fn keep_for(&self, family: ArtifactFamily) -> usize {
        match family {
            ArtifactFamily::Resize => self.resize,
            ArtifactFamily::Converted => self.converted,
            ArtifactFamily::Sharpen => self.sharpen,
            ArtifactFamily::Enhanced => self.enhanced,
        }
    }
}
