//! The static directory artifacts are written to and served from.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ProcessError;

use super::naming::ArtifactFamily;
use super::retention::{self, PruneReport};

/// Flat directory of artifacts plus the public URL prefix it is served under.
///
/// All methods do blocking filesystem I/O and are meant to run on a blocking
/// thread.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    url_prefix: String,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// Public URL of an artifact.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), filename)
    }

    /// Write an artifact. An existing file of the same name is replaced; names
    /// embed a content digest, so that file holds the same bytes.
    pub fn write(&self, filename: &str, data: &[u8]) -> Result<PathBuf, ProcessError> {
        let path = self.root.join(filename);
        fs::write(&path, data).map_err(|e| {
            ProcessError::transform(format!("failed to write {}: {}", filename, e))
        })?;
        info!(filename, bytes = data.len(), "Saved artifact");
        Ok(path)
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, ProcessError> {
        fs::read(path).map_err(|e| {
            ProcessError::transform(format!("failed to read {}: {}", path.display(), e))
        })
    }

    /// Resolve an artifact named by a client.
    ///
    /// The name must be a bare file name belonging to one of `families`.
    pub fn resolve(
        &self,
        filename: &str,
        families: &[ArtifactFamily],
    ) -> Result<PathBuf, ProcessError> {
        let filename = filename.trim();
        if !is_bare_filename(filename) {
            return Err(ProcessError::invalid_field(
                "source",
                "must be a file name returned by a previous request",
            ));
        }
        if !families.iter().any(|family| family.contains(filename)) {
            return Err(ProcessError::invalid_field(
                "source",
                format!("must name a {} artifact", family_list(families)),
            ));
        }

        let path = self.root.join(filename);
        if !path.is_file() {
            debug!(filename, "Requested source artifact does not exist");
            return Err(no_source(families));
        }
        Ok(path)
    }

    /// Most recently modified artifact across `families`.
    pub fn latest(&self, families: &[ArtifactFamily]) -> Result<PathBuf, ProcessError> {
        let prefixes: Vec<&str> = families.iter().map(|f| f.prefix()).collect();
        retention::latest(&self.root, &prefixes).ok_or_else(|| no_source(families))
    }

    /// Apply retention to one family. `pinned` names an artifact that must
    /// survive, usually the one just written.
    pub fn prune(
        &self,
        family: ArtifactFamily,
        keep_latest: usize,
        pinned: Option<&str>,
    ) -> PruneReport {
        let report = retention::prune(&self.root, family.prefix(), keep_latest, pinned);
        if !report.deleted.is_empty() {
            debug!(
                family = %family,
                deleted = report.deleted.len(),
                kept = report.kept.len(),
                "Pruned artifact family"
            );
        }
        report
    }
}

fn is_bare_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

fn family_list(families: &[ArtifactFamily]) -> String {
    families
        .iter()
        .map(|f| f.prefix())
        .collect::<Vec<_>>()
        .join(" or ")
}

fn no_source(families: &[ArtifactFamily]) -> ProcessError {
    ProcessError::NoSourceArtifact {
        prefixes: families.iter().map(|f| format!("{}_*", f.prefix())).collect(),
    }
}
