//! Unified diffs of merged-resolved text paths against a real directory tree.

use std::path::{Path, PathBuf};

use similar::TextDiff;
use tracing::warn;
use xr_db::read::normalize_path;

use crate::error::Result;
use crate::extract::{disk_target, ExtractFailure};
use crate::fs::{LayerId, LayeredFs, ListMode};
use crate::pattern::GlobPattern;
use crate::text::{decode_archive_text, is_text_path, normalize_line_endings, TextEncoding};

/// Comparison result for one path
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiffStatus {
    /// Both sides decode to the same lines
    Unchanged,
    /// The sides differ; a unified diff is attached
    Modified,
    /// No file under the on-disk tree
    OsMissing,
}

/// One compared path
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Logical path
    pub path: String,
    /// Layer that provided the archive side
    pub layer: LayerId,
    /// On-disk counterpart that was (or would have been) read
    pub os_path: PathBuf,
    /// Comparison result
    pub status: DiffStatus,
    /// Unified diff text for modified paths
    pub unified: Option<String>,
}

/// All per-path results plus the summary counters
#[derive(Debug, Clone, Default)]
pub struct DiffOutcome {
    /// Per-path results, path-sorted
    pub files: Vec<FileDiff>,
    /// Text paths present on both sides
    pub compared: u64,
    /// Compared paths whose lines differ
    pub modified: u64,
    /// Text paths with no on-disk counterpart
    pub os_missing: u64,
    /// Paths whose archive side failed to read; the run continues past them
    pub failures: Vec<ExtractFailure>,
}

impl DiffOutcome {
    /// The conventional one-line summary.
    pub fn summary(&self) -> String {
        format!(
            "compared={} modified={} os_missing={}",
            self.compared, self.modified, self.os_missing
        )
    }
}

impl LayeredFs {
    /// Compare every merged-resolved text path matching `pattern` against the tree under
    /// `other_root`.
    ///
    /// Both sides are normalized to a common line-ending convention before the line diff;
    /// with [`TextEncoding::Utf8`] the archive side is decoded from its Windows-1251 source
    /// encoding first. A missing on-disk file is an [`DiffStatus::OsMissing`] row, not an
    /// error.
    pub fn diff(
        &mut self,
        pattern: &GlobPattern,
        other_root: &Path,
        encoding: TextEncoding,
    ) -> Result<DiffOutcome> {
        let rows: Vec<_> = self
            .list(pattern, ListMode::Merged)
            .into_iter()
            .filter(|row| is_text_path(&normalize_path(&row.path)))
            .collect();

        let mut outcome = DiffOutcome::default();
        for row in rows {
            let os_path = disk_target(other_root, &row.path);

            let bytes = match self.read(&row.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = row.path.as_str(), error = %e, "skipping failed file");
                    outcome.failures.push(ExtractFailure {
                        path: row.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !os_path.is_file() {
                outcome.os_missing += 1;
                outcome.files.push(FileDiff {
                    path: row.path,
                    layer: row.layer,
                    os_path,
                    status: DiffStatus::OsMissing,
                    unified: None,
                });
                continue;
            }

            let archive_text = match encoding {
                TextEncoding::Utf8 => decode_archive_text(&bytes),
                TextEncoding::Raw => String::from_utf8_lossy(&bytes).into_owned(),
            };
            let archive_text = normalize_line_endings(&archive_text, "\n");
            let os_bytes = match std::fs::read(&os_path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = row.path.as_str(), error = %e, "skipping unreadable os file");
                    outcome.failures.push(ExtractFailure {
                        path: row.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let os_text =
                normalize_line_endings(&String::from_utf8_lossy(&os_bytes), "\n");

            outcome.compared += 1;
            let diff = TextDiff::from_lines(&archive_text, &os_text);
            if diff.ratio() < 1.0 {
                outcome.modified += 1;
                let left = format!("{}:{}", self.layer_name(row.layer), row.path);
                let right = format!("OS:{}", os_path.display());
                let unified = diff
                    .unified_diff()
                    .context_radius(3)
                    .header(&left, &right)
                    .to_string();
                outcome.files.push(FileDiff {
                    path: row.path,
                    layer: row.layer,
                    os_path,
                    status: DiffStatus::Modified,
                    unified: Some(unified),
                });
            } else {
                outcome.files.push(FileDiff {
                    path: row.path,
                    layer: row.layer,
                    os_path,
                    status: DiffStatus::Unchanged,
                    unified: None,
                });
            }
        }

        Ok(outcome)
    }
}
