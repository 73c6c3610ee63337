//! The image processing pipeline.
//!
//! Every operation runs the same steps: validate, decode, coerce the colour
//! mode for the output format, transform, encode, save, prune. Everything
//! after validation is CPU or disk bound and runs on a blocking thread.

use std::path::Path;

use image::DynamicImage;
use tracing::info;

use crate::artifact::{ArtifactFamily, ArtifactName, ArtifactStore};
use crate::error::ProcessError;
use crate::imaging::{
    coerce_image, decode, denoise, encode, has_transparency, is_valid_quality, median_radius,
    resize, sharpen, Algorithm, ColorMode, OutputFormat, SharpenParams, DEFAULT_QUALITY,
    NOISE_REDUCTION_RANGE, SHARPNESS_RANGE,
};
use crate::upload::{UploadPolicy, ValidatedUpload};

use super::types::{
    ConvertRequest, ConvertResponse, EnhanceRequest, EnhanceResponse, ResizeRequest,
    ResizeResponse, RetentionPolicy, SharpenRequest, SharpenResponse,
};

/// Largest width or height accepted for a resize.
pub const MAX_DIMENSION: u32 = 16_384;

/// Default `Cache-Control` hint returned with every artifact.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=600, stale-while-revalidate=3600";

// =============================================================================
// Image Service
// =============================================================================

/// Entry point for all image operations.
///
/// # Example
///
/// ```ignore
/// use resize_service::artifact::ArtifactStore;
/// use resize_service::service::{ImageService, ResizeRequest};
/// use resize_service::upload::UploadPolicy;
///
/// let store = ArtifactStore::new("static", "/static");
/// let service = ImageService::new(store, UploadPolicy::default());
///
/// let response = service.resize(ResizeRequest::new(algorithm, upload, 64, 64)).await?;
/// println!("saved {}", response.url);
/// ```
#[derive(Debug, Clone)]
pub struct ImageService {
    store: ArtifactStore,
    upload_policy: UploadPolicy,
    retention: RetentionPolicy,
    cache_control: String,
    default_quality: u8,
}

impl ImageService {
    pub fn new(store: ArtifactStore, upload_policy: UploadPolicy) -> Self {
        Self {
            store,
            upload_policy,
            retention: RetentionPolicy::default(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            default_quality: DEFAULT_QUALITY,
        }
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    /// Quality used when a request does not name one. Clamped to 1-100.
    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.default_quality = crate::imaging::clamp_quality(quality);
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn upload_policy(&self) -> &UploadPolicy {
        &self.upload_policy
    }

    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    /// Resize an upload, keeping its format unless another one is requested.
    pub async fn resize(&self, request: ResizeRequest) -> Result<ResizeResponse, ProcessError> {
        validate_dimensions(request.width, request.height)?;
        validate_range("sharpness", request.sharpness, &SHARPNESS_RANGE)?;
        let quality = self.resolve_quality(request.quality)?;
        let upload = self.upload_policy.validate(request.upload)?;
        let target = request.target_format.unwrap_or(upload.source_format);

        let job = UploadJob {
            algorithm: request.algorithm,
            source_format: upload.source_format,
            upload,
            size: Some((request.width, request.height)),
            target,
            quality,
            sharpness: Some(request.sharpness),
            family: ArtifactFamily::Resize,
        };
        let rendered = self.run_upload_job(job).await?;

        Ok(ResizeResponse {
            url: self.store.url_for(&rendered.filename),
            filename: rendered.filename,
            cache_control: self.cache_control.clone(),
            source_extension: rendered.source_format.extension().to_string(),
            used_extension: target.extension().to_string(),
            algorithm: request.algorithm,
            width: rendered.width,
            height: rendered.height,
            sharpness_applied: request.sharpness,
            original_mode: rendered.original_mode.name().to_string(),
            final_mode: rendered.final_mode.name().to_string(),
            has_transparency: rendered.has_transparency,
        })
    }

    /// Re-encode an upload in another format, optionally resizing it.
    pub async fn convert(&self, request: ConvertRequest) -> Result<ConvertResponse, ProcessError> {
        if let Some((width, height)) = request.size {
            validate_dimensions(width, height)?;
        }
        validate_sharpness(request.sharpness)?;
        let quality = self.resolve_quality(request.quality)?;
        let upload = self.upload_policy.validate(request.upload)?;

        let job = UploadJob {
            algorithm: request.algorithm,
            source_format: upload.source_format,
            upload,
            size: request.size,
            target: request.target_format,
            quality,
            sharpness: request.sharpness,
            family: ArtifactFamily::Converted,
        };
        let rendered = self.run_upload_job(job).await?;

        Ok(ConvertResponse {
            url: self.store.url_for(&rendered.filename),
            filename: rendered.filename,
            cache_control: self.cache_control.clone(),
            source_extension: rendered.source_format.extension().to_string(),
            format: request.target_format.extension().to_string(),
            algorithm: request.algorithm,
            width: rendered.width,
            height: rendered.height,
            quality,
            sharpness_applied: request.sharpness,
            original_mode: rendered.original_mode.name().to_string(),
            final_mode: rendered.final_mode.name().to_string(),
            has_transparency: rendered.has_transparency,
        })
    }

    /// Sharpen or blur an existing resize artifact.
    pub async fn sharpen(&self, request: SharpenRequest) -> Result<SharpenResponse, ProcessError> {
        validate_range("sharpness", request.sharpness, &SHARPNESS_RANGE)?;

        let store = self.store.clone();
        let keep = self.retention.keep_for(ArtifactFamily::Sharpen);
        let quality = self.default_quality;
        let params = SharpenParams::from_sharpness(request.sharpness);
        let sharpness = request.sharpness;

        let chained = run_blocking(move || {
            let (source, image) =
                locate_source(&store, request.source.as_deref(), &[ArtifactFamily::Resize])?;
            let image = sharpen(image, params);
            finish_chained(
                &store,
                image,
                source,
                ArtifactFamily::Sharpen,
                param_tag(sharpness),
                quality,
                keep,
            )
        })
        .await?;

        Ok(SharpenResponse {
            url: self.store.url_for(&chained.filename),
            filename: chained.filename,
            cache_control: self.cache_control.clone(),
            extension: chained.format.extension().to_string(),
            sharpness,
            source_filename: chained.source_filename,
            has_alpha: chained.has_alpha,
            image_mode: chained.final_mode.name().to_string(),
            params,
        })
    }

    /// Median-filter an existing resize or sharpen artifact.
    pub async fn enhance(&self, request: EnhanceRequest) -> Result<EnhanceResponse, ProcessError> {
        validate_range(
            "noise_reduction",
            request.noise_reduction,
            &NOISE_REDUCTION_RANGE,
        )?;

        let store = self.store.clone();
        let keep = self.retention.keep_for(ArtifactFamily::Enhanced);
        let quality = self.default_quality;
        let noise_reduction = request.noise_reduction;
        let radius = median_radius(noise_reduction);

        let chained = run_blocking(move || {
            let (source, image) = locate_source(
                &store,
                request.source.as_deref(),
                &[ArtifactFamily::Resize, ArtifactFamily::Sharpen],
            )?;
            let image = denoise(image, radius);
            finish_chained(
                &store,
                image,
                source,
                ArtifactFamily::Enhanced,
                param_tag(noise_reduction),
                quality,
                keep,
            )
        })
        .await?;

        Ok(EnhanceResponse {
            url: self.store.url_for(&chained.filename),
            filename: chained.filename,
            cache_control: self.cache_control.clone(),
            extension: chained.format.extension().to_string(),
            noise_reduction,
            source_filename: chained.source_filename,
            median_radius: radius,
            has_alpha: chained.has_alpha,
            image_mode: chained.final_mode.name().to_string(),
        })
    }

    fn resolve_quality(&self, requested: Option<u8>) -> Result<u8, ProcessError> {
        match requested {
            None => Ok(self.default_quality),
            Some(quality) if is_valid_quality(quality) => Ok(quality),
            Some(_) => Err(ProcessError::invalid_field(
                "quality",
                "must be between 1 and 100",
            )),
        }
    }

    async fn run_upload_job(&self, job: UploadJob) -> Result<Rendered, ProcessError> {
        let store = self.store.clone();
        let keep = self.retention.keep_for(job.family);
        run_blocking(move || render_upload(&store, job, keep)).await
    }
}

// =============================================================================
// Upload Pipeline
// =============================================================================

/// Everything the blocking half of resize/convert needs.
struct UploadJob {
    algorithm: Algorithm,
    upload: ValidatedUpload,
    source_format: OutputFormat,
    size: Option<(u32, u32)>,
    target: OutputFormat,
    quality: u8,
    sharpness: Option<f32>,
    family: ArtifactFamily,
}

struct Rendered {
    filename: String,
    source_format: OutputFormat,
    width: u32,
    height: u32,
    original_mode: ColorMode,
    final_mode: ColorMode,
    has_transparency: bool,
}

fn render_upload(
    store: &ArtifactStore,
    job: UploadJob,
    keep: usize,
) -> Result<Rendered, ProcessError> {
    let decoded = decode(&job.upload.data)?;
    let original_mode = ColorMode::of(&decoded);

    let (mut image, coercion) = coerce_image(decoded, job.target);
    if let Some((width, height)) = job.size {
        image = resize(&image, width, height, job.algorithm);
    }
    if let Some(sharpness) = job.sharpness {
        image = sharpen(image, SharpenParams::from_sharpness(sharpness));
    }

    let encoded = encode(&image, job.target, job.quality)?;
    let filename = ArtifactName::new(
        job.family.prefix(),
        image.width(),
        image.height(),
        job.target.extension(),
    )
    .with_content(&encoded)
    .to_string();

    store.write(&filename, &encoded)?;
    store.prune(job.family, keep, Some(&filename));

    info!(
        filename = %filename,
        algorithm = %job.algorithm,
        source = %job.source_format,
        target = %job.target,
        coercion = ?coercion,
        width = image.width(),
        height = image.height(),
        "Processed upload"
    );

    Ok(Rendered {
        filename,
        source_format: job.source_format,
        width: image.width(),
        height: image.height(),
        original_mode,
        final_mode: ColorMode::of(&image),
        has_transparency: has_transparency(&image),
    })
}

// =============================================================================
// Chained Pipeline
// =============================================================================

/// A previously written artifact an operation is chained onto.
struct SourceArtifact {
    filename: String,
    format: OutputFormat,
    has_alpha: bool,
}

struct Chained {
    filename: String,
    source_filename: String,
    format: OutputFormat,
    has_alpha: bool,
    final_mode: ColorMode,
}

/// Find the artifact to chain onto: the one named by `source`, or else the
/// newest member of `families`. The image comes back decoded and coerced for
/// re-encoding in the artifact's own format.
fn locate_source(
    store: &ArtifactStore,
    source: Option<&str>,
    families: &[ArtifactFamily],
) -> Result<(SourceArtifact, DynamicImage), ProcessError> {
    let path = match source.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => store.resolve(name, families)?,
        None => store.latest(families)?,
    };

    let filename = file_name_of(&path);
    let format = OutputFormat::from_filename(&filename).unwrap_or(OutputFormat::Png);
    let decoded = decode(&store.read(&path)?)?;
    let has_alpha = ColorMode::of(&decoded).has_alpha();
    let (image, _) = coerce_image(decoded, format);

    Ok((
        SourceArtifact {
            filename,
            format,
            has_alpha,
        },
        image,
    ))
}

fn finish_chained(
    store: &ArtifactStore,
    image: DynamicImage,
    source: SourceArtifact,
    family: ArtifactFamily,
    param: i64,
    quality: u8,
    keep: usize,
) -> Result<Chained, ProcessError> {
    let encoded = encode(&image, source.format, quality)?;
    let filename = ArtifactName::new(
        family.prefix(),
        image.width(),
        image.height(),
        source.format.extension(),
    )
    .with_param(param)
    .with_content(&encoded)
    .to_string();

    store.write(&filename, &encoded)?;
    store.prune(family, keep, Some(&filename));

    info!(
        filename = %filename,
        source = %source.filename,
        family = %family,
        "Processed artifact"
    );

    Ok(Chained {
        filename,
        source_filename: source.filename,
        format: source.format,
        has_alpha: source.has_alpha,
        final_mode: ColorMode::of(&image),
    })
}

// =============================================================================
// Helpers
// =============================================================================

async fn run_blocking<T, F>(work: F) -> Result<T, ProcessError>
where
    F: FnOnce() -> Result<T, ProcessError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProcessError::transform(format!("image worker failed: {}", e)))?
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), ProcessError> {
    for (field, value) in [("width", width), ("height", height)] {
        if value == 0 || value > MAX_DIMENSION {
            return Err(ProcessError::invalid_field(
                field,
                format!("must be between 1 and {}", MAX_DIMENSION),
            ));
        }
    }
    Ok(())
}

fn validate_sharpness(sharpness: Option<f32>) -> Result<(), ProcessError> {
    match sharpness {
        Some(value) => validate_range("sharpness", value, &SHARPNESS_RANGE),
        None => Ok(()),
    }
}

fn validate_range(
    field: &str,
    value: f32,
    range: &std::ops::RangeInclusive<f32>,
) -> Result<(), ProcessError> {
    // NaN fails `contains`.
    if !range.contains(&value) {
        return Err(ProcessError::invalid_field(
            field,
            format!("must be between {} and {}", range.start(), range.end()),
        ));
    }
    Ok(())
}

/// Control value x 10, truncated, as embedded in file names.
fn param_tag(value: f32) -> i64 {
    (value * 10.0).trunc() as i64
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
