//! The layered filesystem: ordered archive layers plus an optional on-disk overlay.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;
use xr_db::read::normalize_path;
use xr_db::{DbArchive, DbVersion};

use crate::error::{Error, Result};
use crate::pattern::GlobPattern;

/// `/`-separated display form of a logical path.
pub(crate) fn display_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// Identity of one layer of the filesystem
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerId {
    /// The loose file overlay directory; always outranks every archive
    Overlay,
    /// Archive at this position in discovery order
    Archive(usize),
}

/// How [`LayeredFs::list`] presents its rows
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ListMode {
    /// One row per distinct logical path, pointing at the winning layer
    #[default]
    Merged,
    /// One row per (path, layer) pair, grouped by layer
    PerLayer,
}

/// One listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    /// Logical path, display casing
    pub path: String,
    /// Winning layer in merged mode, owning layer in per-layer mode
    pub layer: LayerId,
}

/// Which layers hold a path, computed per query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Logical path, display casing of the winning layer
    pub path: String,
    /// Highest-priority layer holding the path
    pub winner: LayerId,
    /// Every layer holding the path, highest priority first
    pub layers: Vec<LayerId>,
}

struct ArchiveLayer {
    name: String,
    archive: DbArchive<File>,
}

struct Overlay {
    name: String,
    root: PathBuf,
}

impl Overlay {
    fn disk_path(&self, path: &str) -> PathBuf {
        let mut disk = self.root.clone();
        for component in path.split('/') {
            disk.push(component);
        }
        disk
    }

    fn has_file(&self, path: &str) -> bool {
        self.disk_path(path).is_file()
    }

    /// Relative `/`-separated paths of every loose file under the overlay root.
    fn walk_files(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                let mut path = String::new();
                for component in rel.components() {
                    if !path.is_empty() {
                        path.push('/');
                    }
                    path.push_str(&component.as_os_str().to_string_lossy());
                }
                Some(path)
            })
            .collect()
    }
}

/// An ordered set of archives plus an optional overlay directory composed into one logical
/// file tree.
///
/// Layers are added in discovery order (ascending file name sort); a later archive shadows an
/// earlier one for paths both carry, and the overlay directory shadows everything. Once
/// [`LayeredFs::seal`] has been called the layer set can no longer change.
#[derive(Default)]
pub struct LayeredFs {
    layers: Vec<ArchiveLayer>,
    overlay: Option<Overlay>,
    sealed: bool,
}

impl LayeredFs {
    /// An empty, unsealed filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an archive file and append it as the next (higher priority) layer.
    pub fn add_archive(&mut self, path: &Path, version: DbVersion) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed);
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path)?;
        let archive = DbArchive::new(file, version)?;
        info!(layer = name.as_str(), files = archive.files().count(), "opened archive layer");
        self.layers.push(ArchiveLayer { name, archive });
        Ok(())
    }

    /// Attach the loose file overlay directory.
    pub fn set_overlay(&mut self, root: &Path) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed);
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        self.overlay = Some(Overlay {
            name,
            root: root.to_path_buf(),
        });
        Ok(())
    }

    /// Freeze the layer set; queries only from here on.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether the layer set is frozen.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of archive layers (the overlay not included).
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Display name of a layer.
    pub fn layer_name(&self, id: LayerId) -> &str {
        match id {
            LayerId::Overlay => self.overlay.as_ref().map(|o| o.name.as_str()).unwrap_or("overlay"),
            LayerId::Archive(idx) => &self.layers[idx].name,
        }
    }

    /// Which layers hold `path`, highest priority first; `None` when no layer does.
    pub fn resolve(&self, path: &str) -> Option<Resolved> {
        let norm = normalize_path(path);
        let mut layers = Vec::new();
        let mut display = None;

        if let Some(overlay) = &self.overlay {
            let rel = display_path(path);
            if overlay.has_file(&rel) {
                layers.push(LayerId::Overlay);
                display = Some(rel);
            }
        }
        for (idx, layer) in self.layers.iter().enumerate().rev() {
            if let Some(entry) = layer.archive.by_name(&norm) {
                if entry.is_file() {
                    layers.push(LayerId::Archive(idx));
                    if display.is_none() {
                        display = Some(entry.name.to_string());
                    }
                }
            }
        }

        let winner = *layers.first()?;
        Some(Resolved {
            path: display?,
            winner,
            layers,
        })
    }

    /// File paths matching `pattern`, path-sorted within each group.
    pub fn list(&self, pattern: &GlobPattern, mode: ListMode) -> Vec<ListRow> {
        match mode {
            ListMode::Merged => {
                // ascending layer walk, later inserts win; BTreeMap keeps path order
                let mut rows: BTreeMap<String, ListRow> = BTreeMap::new();
                for (idx, layer) in self.layers.iter().enumerate() {
                    for entry in layer.archive.files() {
                        let norm = normalize_path(&entry.name);
                        if pattern.matches(&norm) {
                            rows.insert(
                                norm,
                                ListRow {
                                    path: entry.name.to_string(),
                                    layer: LayerId::Archive(idx),
                                },
                            );
                        }
                    }
                }
                if let Some(overlay) = &self.overlay {
                    for rel in overlay.walk_files() {
                        let norm = normalize_path(&rel);
                        if pattern.matches(&norm) {
                            rows.insert(
                                norm,
                                ListRow {
                                    path: rel,
                                    layer: LayerId::Overlay,
                                },
                            );
                        }
                    }
                }
                rows.into_values().collect()
            }
            ListMode::PerLayer => {
                let mut rows = Vec::new();
                for (idx, layer) in self.layers.iter().enumerate() {
                    let mut group: Vec<(String, String)> = layer
                        .archive
                        .files()
                        .map(|e| (normalize_path(&e.name), e.name.to_string()))
                        .filter(|(norm, _)| pattern.matches(norm))
                        .collect();
                    group.sort();
                    rows.extend(group.into_iter().map(|(_, path)| ListRow {
                        path,
                        layer: LayerId::Archive(idx),
                    }));
                }
                if let Some(overlay) = &self.overlay {
                    let mut group: Vec<(String, String)> = overlay
                        .walk_files()
                        .into_iter()
                        .map(|rel| (normalize_path(&rel), rel))
                        .filter(|(norm, _)| pattern.matches(norm))
                        .collect();
                    group.sort();
                    rows.extend(group.into_iter().map(|(_, path)| ListRow {
                        path,
                        layer: LayerId::Overlay,
                    }));
                }
                rows
            }
        }
    }

    /// Merged cardinality of `pattern`.
    pub fn count(&self, pattern: &GlobPattern) -> u64 {
        self.list(pattern, ListMode::Merged).len() as u64
    }

    /// Authoritative bytes of `path` from its winning layer.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>> {
        let resolved = self.resolve(path).ok_or_else(|| {
            Error::Db(xr_db::error::FileNotFoundError::Name(path.to_owned()).into())
        })?;
        self.read_winner(&resolved)
    }

    pub(crate) fn read_winner(&mut self, resolved: &Resolved) -> Result<Vec<u8>> {
        match resolved.winner {
            LayerId::Overlay => {
                let overlay = self.overlay.as_ref().ok_or_else(|| {
                    Error::Db(
                        xr_db::error::FileNotFoundError::Name(resolved.path.clone()).into(),
                    )
                })?;
                Ok(std::fs::read(overlay.disk_path(&resolved.path))?)
            }
            LayerId::Archive(idx) => Ok(self.layers[idx].archive.read_file(&resolved.path)?),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{LayeredFs, ListMode};
    use crate::error::Error;
    use crate::pattern::GlobPattern;

    #[test]
    fn empty_fs_lists_nothing() {
        let fs = LayeredFs::new();
        let pattern = GlobPattern::match_all();
        assert!(fs.list(&pattern, ListMode::Merged).is_empty());
        assert_eq!(fs.count(&pattern), 0);
        assert!(fs.resolve("cfg/x.ltx").is_none());
    }

    #[test]
    fn sealed_fs_rejects_additions() {
        let mut fs = LayeredFs::new();
        fs.seal();
        assert!(fs.is_sealed());
        assert!(matches!(
            fs.add_archive(std::path::Path::new("gamedata.db0"), xr_db::DbVersion::V2947Ru),
            Err(Error::AlreadySealed)
        ));
        assert!(matches!(
            fs.set_overlay(std::path::Path::new("gamedata")),
            Err(Error::AlreadySealed)
        ));
    }

    #[test]
    fn missing_path_reads_as_not_found() {
        let mut fs = LayeredFs::new();
        fs.seal();
        assert!(fs.read("nowhere.ltx").is_err());
    }
}
