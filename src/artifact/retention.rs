//! Retention pruning for artifact families.
//!
//! Pruning is best-effort: it never fails the caller. A directory that cannot
//! be listed prunes nothing, and a file that cannot be deleted is logged and
//! skipped. No lock is taken, so a file written concurrently with a prune
//! pass may or may not be seen by it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

/// Outcome of a prune pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Files that matched the prefix and were kept
    pub kept: Vec<PathBuf>,

    /// Files that were deleted
    pub deleted: Vec<PathBuf>,

    /// Files that should have been deleted but could not be
    pub failed: Vec<PathBuf>,
}

/// Keep the `keep_latest` most recently modified `{prefix}_*` files in
/// `directory` and delete the rest.
///
/// The newest file always survives, so a `keep_latest` of zero behaves as 1.
/// A `pinned` file name, typically the artifact just written, wins ties
/// against files with the same modification time. It never displaces a
/// strictly newer file.
pub fn prune(
    directory: &Path,
    prefix: &str,
    keep_latest: usize,
    pinned: Option<&str>,
) -> PruneReport {
    let mut report = PruneReport::default();

    let mut entries = match list_family(directory, prefix) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                directory = %directory.display(),
                prefix,
                "Failed to list artifacts for pruning: {}",
                e
            );
            return report;
        }
    };

    sort_newest_first(&mut entries);
    if let Some(pinned) = pinned {
        promote_within_tie(&mut entries, pinned);
    }

    let keep = keep_latest.max(1);
    for (index, (path, _)) in entries.into_iter().enumerate() {
        if index < keep {
            report.kept.push(path);
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Pruned artifact");
                report.deleted.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to delete artifact: {}", e);
                report.failed.push(path);
            }
        }
    }

    report
}

/// Most recently modified `{prefix}_*` file across several prefixes.
pub fn latest(directory: &Path, prefixes: &[&str]) -> Option<PathBuf> {
    let mut entries = Vec::new();
    for prefix in prefixes {
        match list_family(directory, prefix) {
            Ok(found) => entries.extend(found),
            Err(e) => warn!(
                directory = %directory.display(),
                prefix,
                "Failed to list artifacts: {}",
                e
            ),
        }
    }

    sort_newest_first(&mut entries);
    entries.into_iter().next().map(|(path, _)| path)
}

/// Regular files in `directory` whose name starts with `{prefix}_`, with
/// their modification times.
fn list_family(directory: &Path, prefix: &str) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    let pattern = format!("{}_", prefix);
    let mut found = Vec::new();

    for entry in fs::read_dir(directory)? {
        // Entries can vanish between listing and stat when requests race.
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&pattern) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((entry.path(), modified));
    }

    Ok(found)
}

/// Move `pinned` to the front of the run of entries sharing its mtime.
fn promote_within_tie(entries: &mut [(PathBuf, SystemTime)], pinned: &str) {
    let Some(index) = entries
        .iter()
        .position(|(path, _)| path.file_name().is_some_and(|name| name == pinned))
    else {
        return;
    };
    let modified = entries[index].1;
    let start = entries[..index]
        .iter()
        .position(|(_, time)| *time == modified)
        .unwrap_or(index);
    entries[start..=index].rotate_right(1);
}

/// Newest first; equal times fall back to the name, latest name first.
fn sort_newest_first(entries: &mut [(PathBuf, SystemTime)]) {
    entries.sort_by(|(a_path, a_time), (b_path, b_time)| {
        b_time.cmp(a_time).then_with(|| b_path.cmp(a_path))
    });
}
