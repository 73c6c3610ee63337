//! Request extractors.
//!
//! - [`AlgorithmPath`] parses the `{algorithm}` path segment so an unknown
//!   algorithm is rejected before the body is read.
//! - [`ImageForm`] reads either a multipart form (with an optional `file`
//!   part) or a urlencoded form into one field map.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::multipart::MultipartError;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::Form;
use bytes::BytesMut;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::StatusCode;

use crate::error::ProcessError;
use crate::imaging::{Algorithm, OutputFormat};
use crate::upload::{UploadPolicy, UploadedImage};

use super::handlers::AppState;

/// Name of the multipart part carrying the image.
pub const FILE_FIELD: &str = "file";

// =============================================================================
// Algorithm Path
// =============================================================================

/// The interpolation algorithm named in the request path.
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmPath(pub Algorithm);

impl<S> FromRequestParts<S> for AlgorithmPath
where
    S: Send + Sync,
{
    type Rejection = ProcessError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(name) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ProcessError::UnknownAlgorithm(e.body_text()))?;
        name.parse().map(AlgorithmPath)
    }
}

// =============================================================================
// Image Form
// =============================================================================

/// Form fields of a request, plus the uploaded file if there was one.
#[derive(Debug, Default)]
pub struct ImageForm {
    fields: HashMap<String, String>,
    file: Option<UploadedImage>,
}

impl ImageForm {
    /// Trimmed value of a field. Blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Parse an optional field.
    pub fn optional<T: FromStr>(&self, name: &str) -> Result<Option<T>, ProcessError> {
        self.text(name)
            .map(|value| {
                value.parse().map_err(|_| {
                    ProcessError::invalid_field(name, format!("cannot parse '{}'", value))
                })
            })
            .transpose()
    }

    /// Parse a field that must be present.
    pub fn required<T: FromStr>(&self, name: &str) -> Result<T, ProcessError> {
        self.optional(name)?
            .ok_or_else(|| ProcessError::invalid_field(name, "is required"))
    }

    /// Parse an optional output format field.
    pub fn format(&self, name: &str) -> Result<Option<OutputFormat>, ProcessError> {
        self.text(name).map(OutputFormat::from_str).transpose()
    }

    /// Take the uploaded file.
    pub fn take_file(&mut self) -> Result<UploadedImage, ProcessError> {
        self.file
            .take()
            .ok_or_else(|| ProcessError::invalid_field(FILE_FIELD, "is required"))
    }

    #[cfg(test)]
    pub(crate) fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }
}

impl FromRequest<AppState> for ImageForm {
    type Rejection = ProcessError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ProcessError::invalid_field("body", e.body_text()))?;
            read_multipart(multipart, state.service.upload_policy()).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ProcessError::invalid_field("body", e.body_text()))?;
            Ok(Self { fields, file: None })
        } else {
            Err(ProcessError::invalid_field(
                "body",
                "expected multipart/form-data or application/x-www-form-urlencoded",
            ))
        }
    }
}

/// Read every part of a multipart body.
///
/// The file part's content type is checked before its body is read, and the
/// body is abandoned as soon as it grows past the upload cap.
async fn read_multipart(
    mut multipart: Multipart,
    policy: &UploadPolicy,
) -> Result<ImageForm, ProcessError> {
    let mut form = ImageForm::default();
    let mut received = 0usize;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, received, policy))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name != FILE_FIELD {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error(e, received, policy))?;
            received += value.len();
            form.fields.insert(name, value);
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        policy.resolve_content_type(content_type.as_deref(), filename.as_deref())?;

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, received + data.len(), policy))?
        {
            data.extend_from_slice(&chunk);
            policy.check_size(data.len())?;
        }
        received += data.len();

        form.file = Some(UploadedImage {
            data: data.freeze(),
            content_type,
            filename,
        });
    }

    Ok(form)
}

/// A body-limit rejection means the upload was too large; anything else is a
/// malformed form.
fn multipart_error(err: MultipartError, received: usize, policy: &UploadPolicy) -> ProcessError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ProcessError::PayloadTooLarge {
            size: received.max(policy.max_bytes() + 1),
            max: policy.max_bytes(),
        };
    }
    ProcessError::invalid_field("body", err.body_text())
}
