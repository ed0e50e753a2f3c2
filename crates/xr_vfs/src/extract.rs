//! Materializing merged-resolved paths onto disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};
use xr_db::read::normalize_path;

use crate::error::{Error, Result};
use crate::fs::{LayeredFs, ListMode};
use crate::pattern::GlobPattern;
use crate::text::{is_text_path, to_host_text, TextEncoding, HOST_LINE_SEPARATOR_NAME};

/// Knobs for [`LayeredFs::extract`]
#[derive(Debug, Copy, Clone, Default)]
pub struct ExtractOptions {
    /// Replace files already present under the destination
    pub overwrite: bool,

    /// Target form of text files
    pub encoding: TextEncoding,

    /// Do everything except the final write
    pub dry_run: bool,
}

/// One path that could not be materialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractFailure {
    /// Logical path
    pub path: String,
    /// Human-readable reason
    pub reason: String,
}

/// Outcome of one extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    /// Paths matched by the pattern
    pub checked: u64,
    /// Paths written (or that would have been written on a dry run)
    pub written: u64,
    /// Paths left alone because the destination file already exists
    pub skipped: u64,
    /// Paths that failed; the run continues past them
    pub failures: Vec<ExtractFailure>,
}

impl ExtractReport {
    /// The conventional one-line summary.
    pub fn summary(&self, encoding: TextEncoding) -> String {
        format!(
            "checked={} written={} skipped={} encoding={} line_separator={}",
            self.checked,
            self.written,
            self.skipped,
            encoding.name(),
            HOST_LINE_SEPARATOR_NAME,
        )
    }
}

/// Logical `/`-separated path to a real path under `root`.
pub(crate) fn disk_target(root: &Path, path: &str) -> PathBuf {
    let mut target = root.to_path_buf();
    for component in path.split('/') {
        target.push(component);
    }
    target
}

fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(target).map_err(|e| Error::Persist {
        path: target.display().to_string(),
        source: e.error,
    })?;
    Ok(())
}

impl LayeredFs {
    /// Materialize every merged-resolved file matching `pattern` under `destination`.
    ///
    /// Existing files are skipped unless `overwrite` is set, so a partial run can be resumed
    /// by re-running. Per-file failures are collected and the batch continues.
    pub fn extract(
        &mut self,
        pattern: &GlobPattern,
        destination: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractReport> {
        let rows = self.list(pattern, ListMode::Merged);
        let mut report = ExtractReport::default();

        for row in rows {
            report.checked += 1;
            let target = disk_target(destination, &row.path);

            if !options.overwrite && target.exists() {
                report.skipped += 1;
                continue;
            }

            let bytes = match self
                .resolve(&row.path)
                .ok_or_else(|| {
                    Error::Db(
                        xr_db::error::FileNotFoundError::Name(row.path.clone()).into(),
                    )
                })
                .and_then(|resolved| self.read_winner(&resolved))
            {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = row.path.as_str(), error = %e, "skipping failed file");
                    report.failures.push(ExtractFailure {
                        path: row.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let bytes = if options.encoding == TextEncoding::Utf8
                && is_text_path(&normalize_path(&row.path))
            {
                to_host_text(&bytes).into_bytes()
            } else {
                bytes
            };

            if options.dry_run {
                report.written += 1;
                continue;
            }

            let outcome = target
                .parent()
                .map(std::fs::create_dir_all)
                .transpose()
                .map_err(Error::from)
                .and_then(|_| write_atomic(&target, &bytes));
            match outcome {
                Ok(()) => {
                    info!(path = row.path.as_str(), "written");
                    report.written += 1;
                }
                Err(e) => {
                    warn!(path = row.path.as_str(), error = %e, "write failed");
                    report.failures.push(ExtractFailure {
                        path: row.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            checked = report.checked,
            written = report.written,
            skipped = report.skipped,
            failed = report.failures.len(),
            "extraction finished"
        );
        Ok(report)
    }
}
