//! Resize, sharpen/blur and denoise operations.
//!
//! The pixel math is done by the `image` and `imageproc` crates. This module
//! only chooses kernels and parameters, and keeps alpha channels out of the
//! filters so transparency survives sharpening and denoising untouched.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Pixel, Rgba, RgbaImage};
use imageproc::filter::median_filter;
use serde::Serialize;

use crate::error::ProcessError;

/// Accepted range for the sharpness control.
pub const SHARPNESS_RANGE: RangeInclusive<f32> = -2.0..=2.0;

/// Accepted range for the noise reduction control.
pub const NOISE_REDUCTION_RANGE: RangeInclusive<f32> = 0.0..=10.0;

// =============================================================================
// Interpolation
// =============================================================================

/// Interpolation kernel used for resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Nearest, Algorithm::Bilinear, Algorithm::Bicubic];

    /// Path segment and display name.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Nearest => "nearest",
            Algorithm::Bilinear => "bilinear",
            Algorithm::Bicubic => "bicubic",
        }
    }

    fn filter_type(self) -> FilterType {
        match self {
            Algorithm::Nearest => FilterType::Nearest,
            Algorithm::Bilinear => FilterType::Triangle,
            Algorithm::Bicubic => FilterType::CatmullRom,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProcessError::UnknownAlgorithm(s.to_string()))
    }
}

/// Resize to exactly `width` x `height`, ignoring the aspect ratio.
pub fn resize(image: &DynamicImage, width: u32, height: u32, algorithm: Algorithm) -> DynamicImage {
    image.resize_exact(width, height, algorithm.filter_type())
}

// =============================================================================
// Sharpen / Blur
// =============================================================================

/// Filter chosen for a sharpness value.
///
/// - `0` leaves the image alone
/// - negative values blur with radius `|s| * 2`
/// - positive values apply an unsharp mask with radius `1 + s / 2` and
///   strength `100 + s * 50` percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SharpenParams {
    Identity,
    GaussianBlur {
        radius: f32,
    },
    UnsharpMask {
        radius: f32,
        percent: i32,
        threshold: i32,
    },
}

impl SharpenParams {
    pub fn from_sharpness(sharpness: f32) -> Self {
        if sharpness == 0.0 {
            SharpenParams::Identity
        } else if sharpness < 0.0 {
            SharpenParams::GaussianBlur {
                radius: sharpness.abs() * 2.0,
            }
        } else {
            SharpenParams::UnsharpMask {
                radius: 1.0 + sharpness * 0.5,
                percent: 100 + (sharpness * 50.0).trunc() as i32,
                threshold: (3 - (sharpness * 1.5).trunc() as i32).max(0),
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, SharpenParams::Identity)
    }
}

/// Sharpen or blur the colour channels of an image.
pub fn sharpen(image: DynamicImage, params: SharpenParams) -> DynamicImage {
    match params {
        SharpenParams::Identity => image,
        SharpenParams::GaussianBlur { radius } => map_color_channels(image, |c| c.blur(radius)),
        SharpenParams::UnsharpMask {
            radius,
            percent,
            threshold,
        } => map_color_channels(image, |color| match color {
            DynamicImage::ImageLuma8(gray) => {
                DynamicImage::ImageLuma8(unsharp_mask(gray, radius, percent, threshold))
            }
            other => DynamicImage::ImageRgb8(unsharp_mask(
                other.to_rgb8(),
                radius,
                percent,
                threshold,
            )),
        }),
    }
}

/// Add `percent` of the difference from a Gaussian blur back to every sample
/// that differs from the blur by more than `threshold`.
fn unsharp_mask<P>(
    image: ImageBuffer<P, Vec<u8>>,
    radius: f32,
    percent: i32,
    threshold: i32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let blurred = imageops::blur(&image, radius);
    let mut output = image;

    for (sample, smooth) in output.iter_mut().zip(blurred.iter()) {
        let diff = i32::from(*sample) - i32::from(*smooth);
        if diff.abs() > threshold {
            *sample = (i32::from(*sample) + diff * percent / 100).clamp(0, 255) as u8;
        }
    }
    output
}

// =============================================================================
// Denoise
// =============================================================================

/// Median filter radius for a noise reduction strength.
pub fn median_radius(noise_reduction: f32) -> u32 {
    (noise_reduction.max(0.0) / 2.0).ceil() as u32
}

/// Median-filter the colour channels of an image. A radius of zero is a no-op.
pub fn denoise(image: DynamicImage, radius: u32) -> DynamicImage {
    if radius == 0 {
        return image;
    }

    map_color_channels(image, |color| match color {
        DynamicImage::ImageLuma8(gray) => {
            DynamicImage::ImageLuma8(median_filter(&gray, radius, radius))
        }
        other => DynamicImage::ImageRgb8(median_filter(&other.to_rgb8(), radius, radius)),
    })
}

/// Run `op` on the colour channels only, carrying the alpha channel over
/// unchanged. Images without alpha are passed to `op` directly.
fn map_color_channels<F>(image: DynamicImage, op: F) -> DynamicImage
where
    F: FnOnce(DynamicImage) -> DynamicImage,
{
    if !image.color().has_alpha() {
        return op(image);
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let alpha: Vec<u8> = rgba.pixels().map(|p| p[3]).collect();

    let color = op(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())).to_rgb8();

    let mut output = RgbaImage::new(width, height);
    for ((target, source), a) in output.pixels_mut().zip(color.pixels()).zip(alpha) {
        *target = Rgba([source[0], source[1], source[2], a]);
    }
    DynamicImage::ImageRgba8(output)
}
