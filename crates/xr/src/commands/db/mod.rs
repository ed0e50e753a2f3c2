use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing::warn;
use xr_db::DbVersion;
use xr_vfs::{GlobPattern, LayeredFs};

pub mod diff;
pub mod extract;
pub mod info;
pub mod list;

#[derive(clap::Subcommand)]
pub enum DbCommands {
    /// List logical paths across a set of archives
    List(list::ListArgs),
    /// Extract logical paths into a directory
    Extract(extract::ExtractArgs),
    /// Compare archive contents against an on-disk gamedata tree
    Diff(diff::DiffArgs),
    /// Inspect one archive: chunks, records, checksums
    Info(info::InfoArgs),
}

impl DbCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            DbCommands::List(list) => list.handle(),
            DbCommands::Extract(extract) => extract.handle(),
            DbCommands::Diff(diff) => diff.handle(),
            DbCommands::Info(info) => info.handle(),
        }
    }
}

/// Expand an archive file glob into discovery order (ascending file name sort).
pub(crate) fn discover_archives(file_glob: &str) -> Result<Vec<PathBuf>> {
    let glob_path = Path::new(file_glob);
    let dir = match glob_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name_pattern = glob_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| miette!("not a usable archive glob: {file_glob}"))?;
    let pattern = GlobPattern::new(name_pattern)?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_diagnostic()
        .context(format!("path: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.matches(n))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(miette!("no archives match {file_glob}"));
    }
    Ok(paths)
}

/// Open every archive as a layer, skipping the ones that fail, and seal the set.
pub(crate) fn build_layered_fs(
    paths: &[PathBuf],
    version: DbVersion,
    overlay: Option<&Path>,
) -> Result<LayeredFs> {
    let mut layered = LayeredFs::new();
    for path in paths {
        if let Err(e) = layered.add_archive(path, version) {
            warn!("skipping {}: {e}", path.display());
        }
    }
    if let Some(root) = overlay {
        layered.set_overlay(root)?;
    }
    layered.seal();
    Ok(layered)
}

/// Compile the optional logical path filter.
pub(crate) fn path_filter(filter: Option<&str>) -> Result<GlobPattern> {
    Ok(match filter {
        Some(filter) => GlobPattern::new(filter)?,
        None => GlobPattern::match_all(),
    })
}
