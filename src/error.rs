use thiserror::Error;

/// Errors that can occur while processing an image request.
///
/// Each variant corresponds to one failure kind a client can observe. The
/// mapping to HTTP status codes lives in the server layer.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// Declared content type is not an accepted image type (HTTP 400)
    #[error("Unsupported media type '{content_type}', expected one of: {}", allowed.join(", "))]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },

    /// Uploaded body exceeds the configured cap (HTTP 400)
    #[error("Upload too large: {size} bytes exceeds the maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Requested output format is not one of the supported encoders (HTTP 400)
    #[error("Unsupported target format: {format}")]
    UnsupportedTargetFormat { format: String },

    /// A form field is missing, unparseable or out of range (HTTP 422)
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Path names an interpolation algorithm we do not provide (HTTP 404)
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// No artifact available to chain an operation onto (HTTP 404)
    #[error("No source artifact found matching {}", prefixes.join(" or "))]
    NoSourceArtifact { prefixes: Vec<String> },

    /// The imaging library could not parse the uploaded bytes (HTTP 500)
    #[error("Failed to decode image: {message}")]
    DecodeFailure { message: String },

    /// Anything else that went wrong between decode and save (HTTP 500)
    #[error("Image processing failed: {message}")]
    TransformFailure { message: String },
}

impl ProcessError {
    /// Shorthand for an [`ProcessError::InvalidField`].
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`ProcessError::TransformFailure`].
    pub fn transform(message: impl Into<String>) -> Self {
        ProcessError::TransformFailure {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        ProcessError::TransformFailure {
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for ProcessError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                ProcessError::DecodeFailure {
                    message: err.to_string(),
                }
            }
            other => ProcessError::TransformFailure {
                message: other.to_string(),
            },
        }
    }
}
