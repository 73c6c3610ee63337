//! Upload validation.
//!
//! An upload is admitted when its declared content type is on the allow-list
//! and its body fits under the size cap. Optionally, a missing or unknown
//! content type can be recovered from the file name's extension
//! (`photo.jpg` → `image/jpeg`) before the allow-list is consulted again.

use bytes::Bytes;

use crate::error::ProcessError;
use crate::imaging::OutputFormat;

/// Default upload size cap: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted by default and the format each one decodes as.
pub const DEFAULT_ALLOWED_TYPES: [(&str, OutputFormat); 6] = [
    ("image/jpeg", OutputFormat::Jpeg),
    ("image/png", OutputFormat::Png),
    ("image/webp", OutputFormat::Webp),
    ("image/tiff", OutputFormat::Tiff),
    ("image/bmp", OutputFormat::Bmp),
    ("image/x-ms-bmp", OutputFormat::Bmp),
];

/// A file part received from a request, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// Raw body bytes
    pub data: Bytes,

    /// Declared MIME type of the part, if any
    pub content_type: Option<String>,

    /// Original file name supplied by the client, if any
    pub filename: Option<String>,
}

/// An upload that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub data: Bytes,

    /// Content type the upload was admitted under
    pub content_type: String,

    /// Format implied by the content type
    pub source_format: OutputFormat,
}

/// Admission rules for uploaded images.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: usize,
    allowed: Vec<(String, OutputFormat)>,
    infer_from_extension: bool,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadPolicy {
    /// Create a policy with the default allow-list and the given size cap.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            allowed: DEFAULT_ALLOWED_TYPES
                .iter()
                .map(|(mime, format)| (mime.to_string(), *format))
                .collect(),
            infer_from_extension: false,
        }
    }

    /// Replace the allow-list.
    pub fn with_allowed_types(mut self, allowed: Vec<(String, OutputFormat)>) -> Self {
        self.allowed = allowed;
        self
    }

    /// Recover the content type from the file extension when the declared
    /// one is missing or not allowed.
    pub fn with_extension_inference(mut self, enabled: bool) -> Self {
        self.infer_from_extension = enabled;
        self
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn allowed_types(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(|(mime, _)| mime.as_str())
    }

    /// Reject sizes above the cap.
    pub fn check_size(&self, size: usize) -> Result<(), ProcessError> {
        if size > self.max_bytes {
            return Err(ProcessError::PayloadTooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Resolve the content type an upload is admitted under.
    pub fn resolve_content_type(
        &self,
        declared: Option<&str>,
        filename: Option<&str>,
    ) -> Result<(String, OutputFormat), ProcessError> {
        let declared = declared.map(normalize_mime);

        if let Some(found) = declared.as_deref().and_then(|mime| self.lookup(mime)) {
            return Ok(found);
        }

        if self.infer_from_extension {
            let inferred = filename
                .and_then(OutputFormat::from_filename)
                .and_then(|format| self.lookup(format.mime_type()));
            if let Some(found) = inferred {
                return Ok(found);
            }
        }

        Err(ProcessError::UnsupportedMediaType {
            content_type: declared.unwrap_or_default(),
            allowed: self.allowed_types().map(str::to_string).collect(),
        })
    }

    /// Validate an upload: content type first, then size.
    pub fn validate(&self, upload: UploadedImage) -> Result<ValidatedUpload, ProcessError> {
        let (content_type, source_format) =
            self.resolve_content_type(upload.content_type.as_deref(), upload.filename.as_deref())?;
        self.check_size(upload.data.len())?;

        Ok(ValidatedUpload {
            data: upload.data,
            content_type,
            source_format,
        })
    }

    fn lookup(&self, mime: &str) -> Option<(String, OutputFormat)> {
        self.allowed
            .iter()
            .find(|(allowed, _)| allowed == mime)
            .map(|(allowed, format)| (allowed.clone(), *format))
    }
}

/// Lowercase and drop parameters: `Image/JPEG; q=1` → `image/jpeg`.
fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
