//! Artifact file names.
//!
//! Names follow `{prefix}[_{param}]_{width}x{height}_{unix}_{digest}.{ext}`.
//! The timestamp keeps names sortable and defeats browser caches; the digest
//! is the first [`DIGEST_LEN`] hex characters of the SHA-256 of the encoded
//! bytes, so two artifacts written in the same second only share a name when
//! their contents are identical.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Number of hex characters of the content digest kept in a name.
pub const DIGEST_LEN: usize = 12;

/// Operation family an artifact belongs to. The family is the file name
/// prefix and the unit of retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFamily {
    Resize,
    Converted,
    Sharpen,
    Enhanced,
}

impl ArtifactFamily {
    pub const ALL: [ArtifactFamily; 4] = [
        ArtifactFamily::Resize,
        ArtifactFamily::Converted,
        ArtifactFamily::Sharpen,
        ArtifactFamily::Enhanced,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactFamily::Resize => "resize",
            ArtifactFamily::Converted => "converted",
            ArtifactFamily::Sharpen => "sharpen",
            ArtifactFamily::Enhanced => "enhanced",
        }
    }

    /// Whether `filename` is a member of this family.
    pub fn contains(self, filename: &str) -> bool {
        filename
            .strip_prefix(self.prefix())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl fmt::Display for ArtifactFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Builder for an artifact file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    prefix: String,
    param: Option<i64>,
    width: u32,
    height: u32,
    timestamp: u64,
    digest: Option<String>,
    extension: String,
}

impl ArtifactName {
    /// Start a name stamped with the current time.
    pub fn new(prefix: impl Into<String>, width: u32, height: u32, extension: &str) -> Self {
        Self {
            prefix: prefix.into(),
            param: None,
            width,
            height,
            timestamp: unix_now(),
            digest: None,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Include an integer operation parameter (e.g. sharpness x 10).
    pub fn with_param(mut self, param: i64) -> Self {
        self.param = Some(param);
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Append the digest of the artifact's encoded bytes.
    pub fn with_content(mut self, content: &[u8]) -> Self {
        self.digest = Some(content_digest(content));
        self
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)?;
        if let Some(param) = self.param {
            write!(f, "_{}", param)?;
        }
        write!(f, "_{}x{}_{}", self.width, self.height, self.timestamp)?;
        if let Some(ref digest) = self.digest {
            write!(f, "_{}", digest)?;
        }
        write!(f, ".{}", self.extension)
    }
}

/// Short hex digest of some content.
pub fn content_digest(content: &[u8]) -> String {
    let mut digest = hex::encode(Sha256::digest(content));
    digest.truncate(DIGEST_LEN);
    digest
}

/// Seconds since the Unix epoch. A clock set before 1970 reads as zero.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
