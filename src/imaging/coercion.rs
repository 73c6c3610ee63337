//! Colour-mode coercion policy.
//!
//! Every output format accepts a limited set of pixel layouts. Before an
//! image is encoded, [`coerce`] decides which conversion (if any) brings the
//! decoded colour mode into that set, and [`apply`] performs it.
//!
//! # Decision Table
//!
//! | target     | alpha mode          | indexed | grayscale 16 | 16-bit RGB(A) | float        |
//! |------------|---------------------|---------|--------------|---------------|--------------|
//! | JPEG, BMP  | flatten onto white  | → RGB   | → grayscale  | → RGB         | → RGB        |
//! | PNG        | LA → RGBA, else keep| → RGBA  | keep         | keep          | → RGB / RGBA |
//! | WEBP       | LA → RGBA, else keep| → RGBA  | → grayscale  | → RGB / RGBA  | → RGB / RGBA |
//! | TIFF       | LA → RGBA, else keep| → RGBA  | keep         | → RGB / RGBA  | → RGB / RGBA |
//!
//! 8-bit grayscale and RGB pass through unchanged for every format.

use image::{DynamicImage, Rgba, RgbaImage};

use super::format::OutputFormat;

/// Colour mode of a decoded image, as far as encoding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// 8-bit luminance
    Grayscale,
    /// 8-bit luminance with alpha
    GrayscaleAlpha,
    /// 8-bit truecolour
    Rgb,
    /// 8-bit truecolour with alpha
    Rgba,
    /// Palette-based. The decoder expands palettes, so this only appears in
    /// modes reported by other sources.
    Indexed,
    /// 16-bit luminance
    DeepGrayscale,
    /// 16-bit luminance+alpha or truecolour
    Extended { has_alpha: bool },
    /// 32-bit float truecolour
    Float { has_alpha: bool },
}

impl ColorMode {
    /// Every mode, used to check that the table is total.
    pub const ALL: [ColorMode; 10] = [
        ColorMode::Grayscale,
        ColorMode::GrayscaleAlpha,
        ColorMode::Rgb,
        ColorMode::Rgba,
        ColorMode::Indexed,
        ColorMode::DeepGrayscale,
        ColorMode::Extended { has_alpha: false },
        ColorMode::Extended { has_alpha: true },
        ColorMode::Float { has_alpha: false },
        ColorMode::Float { has_alpha: true },
    ];

    /// Colour mode of a decoded image.
    pub fn of(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(_) => ColorMode::Grayscale,
            DynamicImage::ImageLumaA8(_) => ColorMode::GrayscaleAlpha,
            DynamicImage::ImageRgb8(_) => ColorMode::Rgb,
            DynamicImage::ImageRgba8(_) => ColorMode::Rgba,
            DynamicImage::ImageLuma16(_) => ColorMode::DeepGrayscale,
            DynamicImage::ImageRgb32F(_) => ColorMode::Float { has_alpha: false },
            DynamicImage::ImageRgba32F(_) => ColorMode::Float { has_alpha: true },
            other => ColorMode::Extended {
                has_alpha: other.color().has_alpha(),
            },
        }
    }

    pub fn has_alpha(self) -> bool {
        match self {
            ColorMode::GrayscaleAlpha | ColorMode::Rgba => true,
            ColorMode::Extended { has_alpha } | ColorMode::Float { has_alpha } => has_alpha,
            _ => false,
        }
    }

    /// Short name reported to clients (`L`, `LA`, `RGB`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Grayscale => "L",
            ColorMode::GrayscaleAlpha => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Indexed => "P",
            ColorMode::DeepGrayscale => "I;16",
            ColorMode::Extended { has_alpha: false } => "RGB;wide",
            ColorMode::Extended { has_alpha: true } => "RGBA;wide",
            ColorMode::Float { has_alpha: false } => "RGB;float",
            ColorMode::Float { has_alpha: true } => "RGBA;float",
        }
    }

    /// Whether the encoder for `format` accepts this mode as-is.
    pub fn is_encodable_as(self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Jpeg | OutputFormat::Bmp => {
                matches!(self, ColorMode::Grayscale | ColorMode::Rgb)
            }
            OutputFormat::Png => matches!(
                self,
                ColorMode::Grayscale
                    | ColorMode::GrayscaleAlpha
                    | ColorMode::Rgb
                    | ColorMode::Rgba
                    | ColorMode::DeepGrayscale
                    | ColorMode::Extended { .. }
            ),
            OutputFormat::Webp => matches!(
                self,
                ColorMode::Grayscale | ColorMode::GrayscaleAlpha | ColorMode::Rgb | ColorMode::Rgba
            ),
            OutputFormat::Tiff => matches!(
                self,
                ColorMode::Grayscale | ColorMode::DeepGrayscale | ColorMode::Rgb | ColorMode::Rgba
            ),
        }
    }
}

/// Conversion required before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    None,
    /// Composite over an opaque white canvas using the image's own alpha,
    /// then drop the alpha channel.
    FlattenAlphaOntoWhite,
    ConvertToRgb,
    ConvertToRgba,
    ConvertToGrayscale,
}

impl Coercion {
    /// Colour mode an image in `mode` ends up in after this conversion.
    pub fn resulting_mode(self, mode: ColorMode) -> ColorMode {
        match self {
            Coercion::None => mode,
            Coercion::FlattenAlphaOntoWhite | Coercion::ConvertToRgb => ColorMode::Rgb,
            Coercion::ConvertToRgba => ColorMode::Rgba,
            Coercion::ConvertToGrayscale => ColorMode::Grayscale,
        }
    }
}

/// Decide the conversion needed to encode an image in `mode` as `target`.
pub fn coerce(mode: ColorMode, target: OutputFormat) -> Coercion {
    match target {
        OutputFormat::Jpeg | OutputFormat::Bmp => match mode {
            m if m.has_alpha() => Coercion::FlattenAlphaOntoWhite,
            ColorMode::Grayscale | ColorMode::Rgb => Coercion::None,
            ColorMode::DeepGrayscale => Coercion::ConvertToGrayscale,
            _ => Coercion::ConvertToRgb,
        },
        OutputFormat::Png => match mode {
            ColorMode::Grayscale
            | ColorMode::Rgb
            | ColorMode::Rgba
            | ColorMode::DeepGrayscale
            | ColorMode::Extended { .. } => Coercion::None,
            ColorMode::Float { has_alpha: false } => Coercion::ConvertToRgb,
            ColorMode::Indexed | ColorMode::GrayscaleAlpha | ColorMode::Float { .. } => {
                Coercion::ConvertToRgba
            }
        },
        OutputFormat::Webp | OutputFormat::Tiff => match mode {
            ColorMode::Grayscale | ColorMode::Rgb | ColorMode::Rgba => Coercion::None,
            ColorMode::Indexed | ColorMode::GrayscaleAlpha => Coercion::ConvertToRgba,
            ColorMode::DeepGrayscale if target == OutputFormat::Tiff => Coercion::None,
            ColorMode::DeepGrayscale => Coercion::ConvertToGrayscale,
            ColorMode::Extended { has_alpha: true } | ColorMode::Float { has_alpha: true } => {
                Coercion::ConvertToRgba
            }
            ColorMode::Extended { has_alpha: false } | ColorMode::Float { has_alpha: false } => {
                Coercion::ConvertToRgb
            }
        },
    }
}

/// Perform a conversion chosen by [`coerce`].
pub fn apply(image: DynamicImage, coercion: Coercion) -> DynamicImage {
    match coercion {
        Coercion::None => image,
        Coercion::FlattenAlphaOntoWhite => flatten_onto_white(&image),
        Coercion::ConvertToRgb => DynamicImage::ImageRgb8(image.to_rgb8()),
        Coercion::ConvertToRgba => DynamicImage::ImageRgba8(image.to_rgba8()),
        Coercion::ConvertToGrayscale => DynamicImage::ImageLuma8(image.to_luma8()),
    }
}

/// Coerce `image` so it can be encoded as `target`.
///
/// Returns the converted image together with the conversion that was applied.
pub fn coerce_image(image: DynamicImage, target: OutputFormat) -> (DynamicImage, Coercion) {
    let coercion = coerce(ColorMode::of(&image), target);
    (apply(image, coercion), coercion)
}

fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
    let foreground = image.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(
        foreground.width(),
        foreground.height(),
        Rgba([255, 255, 255, 255]),
    );
    image::imageops::overlay(&mut canvas, &foreground, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}
