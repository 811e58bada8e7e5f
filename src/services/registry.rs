use crate::models::{ModEntry, PackageKind};
use crate::services::bookkeeping::{
    self, BookkeepingWriter, ENABLED_FILE_NAME, FsBookkeeping, ORDER_FILE_NAME,
};
use crate::services::metadata::{self, MetadataReader};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::fs;
use std::io;
use thiserror::Error;

/// Errors that fail a whole scan
///
/// A single malformed mod never produces one of these; it is listed with a
/// fallback name instead.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No mods directory configured")]
    NoPathConfigured,

    #[error("Mods directory not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Mods directory not accessible: {path}: {source}")]
    NotAccessible {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors from enable, disable and reorder
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Mod {0} not found, rescan the mods directory")]
    NotFound(String),

    #[error("Invalid load order: {0}")]
    InvalidPermutation(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of reading a mods directory without installing it in a registry
///
/// Produced by [`ModRegistry::discover`] and applied with
/// [`ModRegistry::install`], so a caller can finish other work between the
/// two and drop the catalog if that work fails.
#[derive(Debug, Clone)]
pub struct Catalog {
    mods_path: Utf8PathBuf,
    entries: Vec<ModEntry>,
    /// Manifest ids with no matching package; kept so a rewrite doesn't drop them
    orphan_enabled: Vec<String>,
    /// Order file contents as read, including ids with no matching package
    saved_order: Vec<String>,
}

impl Catalog {
    pub fn mods_path(&self) -> &Utf8Path {
        &self.mods_path
    }

    pub fn entries(&self) -> &[ModEntry] {
        &self.entries
    }
}

/// In-memory catalog of the mods in one mods directory
///
/// The filesystem is the source of truth. The catalog only changes through an
/// explicit [`scan`](Self::scan) or a mutation that has already been written
/// to disk; a failed write leaves the catalog as it was.
///
/// # Single caller
///
/// No internal locking. Callers must not share a registry across threads
/// without their own synchronization.
pub struct ModRegistry {
    mods_path: Option<Utf8PathBuf>,
    entries: Vec<ModEntry>,
    orphan_enabled: Vec<String>,
    saved_order: Vec<String>,
    reader: MetadataReader,
    writer: Box<dyn BookkeepingWriter>,
}

impl Default for ModRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModRegistry {
    /// Create an empty registry that writes bookkeeping files to disk.
    pub fn new() -> Self {
        Self::with_writer(Box::new(FsBookkeeping))
    }

    /// Create an empty registry with a custom bookkeeping writer.
    pub fn with_writer(writer: Box<dyn BookkeepingWriter>) -> Self {
        Self {
            mods_path: None,
            entries: Vec::new(),
            orphan_enabled: Vec::new(),
            saved_order: Vec::new(),
            reader: MetadataReader::new(),
            writer,
        }
    }

    /// Scan `mods_path` and replace the catalog with the result.
    ///
    /// On error the previous catalog is kept.
    pub fn scan(&mut self, mods_path: &Utf8Path) -> Result<Vec<ModEntry>, ScanError> {
        let catalog = self.discover(mods_path)?;
        self.install(catalog);
        Ok(self.current())
    }

    /// Read `mods_path` into a [`Catalog`] without touching the registry or the disk.
    pub fn discover(&self, mods_path: &Utf8Path) -> Result<Catalog, ScanError> {
        let read_dir = fs::read_dir(mods_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ScanError::NotFound(mods_path.to_path_buf())
            } else {
                ScanError::NotAccessible {
                    path: mods_path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut packages = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", mods_path, e);
                    continue;
                }
            };
            let Ok(file_name) = dir_entry.file_name().into_string() else {
                tracing::warn!(
                    "Skipping entry with non-UTF-8 name in {}: {:?}",
                    mods_path,
                    dir_entry.file_name()
                );
                continue;
            };
            if file_name.starts_with('.') || bookkeeping::is_bookkeeping_file(&file_name) {
                continue;
            }

            let path = mods_path.join(&file_name);
            if let Some(kind) = package_kind(&path) {
                packages.push((file_name, path, kind));
            }
        }

        packages.sort_by(|(a_id, a_path, _), (b_id, b_path, _)| {
            a_id.to_lowercase()
                .cmp(&b_id.to_lowercase())
                .then_with(|| a_path.cmp(b_path))
        });

        let enabled = bookkeeping::read_enabled(mods_path).map_err(|source| {
            ScanError::NotAccessible {
                path: mods_path.join(ENABLED_FILE_NAME),
                source,
            }
        })?;
        let saved_order = bookkeeping::read_order(mods_path).map_err(|source| {
            ScanError::NotAccessible {
                path: mods_path.join(ORDER_FILE_NAME),
                source,
            }
        })?;

        let discovered: IndexSet<&str> = packages.iter().map(|(id, _, _)| id.as_str()).collect();
        let ordered_ids: Vec<String> = saved_order
            .iter()
            .filter(|id| discovered.contains(id.as_str()))
            .cloned()
            .chain(
                discovered
                    .iter()
                    .filter(|id| !saved_order.contains(**id))
                    .map(|id| id.to_string()),
            )
            .collect();

        let mut entries = Vec::with_capacity(packages.len());
        for (load_order, id) in ordered_ids.into_iter().enumerate() {
            let Some((_, path, kind)) = packages.iter().find(|(pid, _, _)| *pid == id) else {
                continue;
            };
            let metadata = match kind {
                PackageKind::Directory => self.reader.read_directory(path),
                PackageKind::Archive => self.reader.read_archive(path),
            };
            let display_name = metadata.name.clone().unwrap_or_else(|| id.clone());
            entries.push(ModEntry {
                enabled: enabled.contains(&id),
                display_name,
                source_path: path.clone(),
                kind: *kind,
                load_order,
                metadata,
                id,
            });
        }

        let orphan_enabled = enabled
            .into_iter()
            .filter(|id| !discovered.contains(id.as_str()))
            .collect();

        tracing::info!(
            "Scanned {}: {} mods, {} enabled",
            mods_path,
            entries.len(),
            entries.iter().filter(|e| e.enabled).count()
        );

        Ok(Catalog {
            mods_path: mods_path.to_path_buf(),
            entries,
            orphan_enabled,
            saved_order: saved_order.into_iter().collect(),
        })
    }

    /// Replace the registry's state with a previously discovered catalog.
    pub fn install(&mut self, catalog: Catalog) {
        self.mods_path = Some(catalog.mods_path);
        self.entries = catalog.entries;
        self.orphan_enabled = catalog.orphan_enabled;
        self.saved_order = catalog.saved_order;
    }

    /// Point-in-time copy of the catalog in load order.
    pub fn current(&self) -> Vec<ModEntry> {
        self.entries.clone()
    }

    /// The directory of the last successful scan.
    pub fn mods_path(&self) -> Option<&Utf8Path> {
        self.mods_path.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&ModEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Enabled mods in the order the game should load them.
    pub fn enabled_in_load_order(&self) -> Vec<&ModEntry> {
        self.entries.iter().filter(|entry| entry.enabled).collect()
    }

    pub fn enable(&mut self, id: &str) -> Result<(), MutationError> {
        self.set_enabled(id, true)
    }

    pub fn disable(&mut self, id: &str) -> Result<(), MutationError> {
        self.set_enabled(id, false)
    }

    fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), MutationError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| MutationError::NotFound(id.to_string()))?;

        if self.entries[index].enabled == enabled {
            tracing::debug!("Mod {} already {}", id, state_word(enabled));
            return Ok(());
        }

        let mods_path = self
            .mods_path
            .as_deref()
            .ok_or_else(|| MutationError::NotFound(id.to_string()))?;

        let manifest: Vec<String> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, entry)| if *i == index { enabled } else { entry.enabled })
            .map(|(_, entry)| entry.id.clone())
            .chain(self.orphan_enabled.iter().cloned())
            .collect();

        self.writer
            .write_enabled(mods_path, &manifest)
            .map_err(|source| MutationError::Write {
                path: mods_path.join(ENABLED_FILE_NAME),
                source,
            })?;

        self.entries[index].enabled = enabled;
        tracing::info!("Mod {} {}", id, state_word(enabled));
        Ok(())
    }

    /// Apply a new load order.
    ///
    /// `new_order` must contain every catalog id exactly once and nothing else.
    pub fn reorder(&mut self, new_order: &[String]) -> Result<(), MutationError> {
        self.check_permutation(new_order)?;

        let Some(mods_path) = self.mods_path.as_deref() else {
            // Nothing scanned and an empty order: nothing to persist.
            return Ok(());
        };

        let order_file = merge_missing_ids(new_order, &self.saved_order);
        self.writer
            .write_order(mods_path, &order_file)
            .map_err(|source| MutationError::Write {
                path: mods_path.join(ORDER_FILE_NAME),
                source,
            })?;
        self.saved_order = order_file;

        let mut remaining = std::mem::take(&mut self.entries);
        for (load_order, id) in new_order.iter().enumerate() {
            if let Some(pos) = remaining.iter().position(|entry| entry.id == *id) {
                let mut entry = remaining.swap_remove(pos);
                entry.load_order = load_order;
                self.entries.push(entry);
            }
        }

        tracing::info!("Applied new load order for {} mods", self.entries.len());
        Ok(())
    }

    fn check_permutation(&self, new_order: &[String]) -> Result<(), MutationError> {
        let known: HashSet<&str> = self.entries.iter().map(|entry| entry.id.as_str()).collect();
        let mut seen = HashSet::with_capacity(new_order.len());

        for id in new_order {
            if !known.contains(id.as_str()) {
                return Err(MutationError::InvalidPermutation(format!("unknown mod {id}")));
            }
            if !seen.insert(id.as_str()) {
                return Err(MutationError::InvalidPermutation(format!("duplicate mod {id}")));
            }
        }

        if let Some(missing) = self
            .entries
            .iter()
            .find(|entry| !seen.contains(entry.id.as_str()))
        {
            return Err(MutationError::InvalidPermutation(format!(
                "missing mod {}",
                missing.id
            )));
        }

        Ok(())
    }
}

/// Put ids from `saved_order` that are not in `new_order` back after the id
/// that preceded them, so a mod that is temporarily absent keeps its slot.
fn merge_missing_ids(new_order: &[String], saved_order: &[String]) -> Vec<String> {
    let present: HashSet<&str> = new_order.iter().map(String::as_str).collect();
    let mut merged = new_order.to_vec();
    let mut anchor: Option<&str> = None;

    for id in saved_order {
        if !present.contains(id.as_str()) {
            let pos = anchor
                .and_then(|a| merged.iter().position(|m| m == a))
                .map_or(0, |p| p + 1);
            merged.insert(pos, id.clone());
        }
        anchor = Some(id.as_str());
    }
    merged
}

fn package_kind(path: &Utf8Path) -> Option<PackageKind> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path, e);
            return None;
        }
    };

    if meta.is_dir() {
        if metadata::directory_has_marker(path) {
            return Some(PackageKind::Directory);
        }
        tracing::debug!("Skipping {}: no {}", path, metadata::MOD_MARKER_FILE);
        return None;
    }

    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !meta.is_file() || !is_zip {
        return None;
    }

    match metadata::archive_marker_entry(path) {
        Ok(Some(_)) => Some(PackageKind::Archive),
        Ok(None) => {
            tracing::debug!("Skipping {}: no {} in archive", path, metadata::MOD_MARKER_FILE);
            None
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable archive {}: {}", path, e);
            None
        }
    }
}

fn state_word(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}
