//! Bookkeeping files kept inside the mods directory.
//!
//! - `tpfmm_enabled.txt`: ids of enabled mods, one per line. The only record
//!   of enabled state; a missing file means nothing is enabled.
//! - `tpfmm_order.txt`: ids in load order. A missing file means discovery order.
//!
//! Both are plain text. Blank lines and lines starting with `#` are ignored so
//! the files can be edited by hand between runs.

use crate::fs_atomic::write_atomic_text;
use camino::Utf8Path;
use indexmap::IndexSet;
use std::fs;
use std::io;

/// Enabled manifest file name
pub const ENABLED_FILE_NAME: &str = "tpfmm_enabled.txt";

/// Load order file name
pub const ORDER_FILE_NAME: &str = "tpfmm_order.txt";

const ENABLED_HEADER: &str = "# Enabled mods, managed by TPF-ModManager";
const ORDER_HEADER: &str = "# Mod load order, managed by TPF-ModManager";

/// Writes the bookkeeping files
///
/// The registry only writes through this trait so a failing disk can be
/// substituted in tests.
#[cfg_attr(test, mockall::automock)]
pub trait BookkeepingWriter {
    /// Replace the enabled manifest with `ids`.
    fn write_enabled(&self, mods_dir: &Utf8Path, ids: &[String]) -> io::Result<()>;

    /// Replace the order file with `ids`.
    fn write_order(&self, mods_dir: &Utf8Path, ids: &[String]) -> io::Result<()>;
}

/// [`BookkeepingWriter`] backed by atomic file replacement
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBookkeeping;

impl BookkeepingWriter for FsBookkeeping {
    fn write_enabled(&self, mods_dir: &Utf8Path, ids: &[String]) -> io::Result<()> {
        write_id_list(&mods_dir.join(ENABLED_FILE_NAME), ENABLED_HEADER, ids)
    }

    fn write_order(&self, mods_dir: &Utf8Path, ids: &[String]) -> io::Result<()> {
        write_id_list(&mods_dir.join(ORDER_FILE_NAME), ORDER_HEADER, ids)
    }
}

/// Read the enabled manifest; empty if the file does not exist.
pub fn read_enabled(mods_dir: &Utf8Path) -> io::Result<IndexSet<String>> {
    read_id_list(&mods_dir.join(ENABLED_FILE_NAME))
}

/// Read the order file; empty if the file does not exist.
pub fn read_order(mods_dir: &Utf8Path) -> io::Result<IndexSet<String>> {
    read_id_list(&mods_dir.join(ORDER_FILE_NAME))
}

/// True if `file_name` is one of the bookkeeping files or their temp files.
pub fn is_bookkeeping_file(file_name: &str) -> bool {
    [ENABLED_FILE_NAME, ORDER_FILE_NAME]
        .iter()
        .any(|name| file_name.starts_with(name))
}

fn read_id_list(path: &Utf8Path) -> io::Result<IndexSet<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexSet::new()),
        Err(e) => return Err(e),
    };

    let contents = match String::from_utf8(bytes) {
        Ok(contents) => contents,
        Err(e) => {
            // Hand edits in a non-UTF-8 editor; ids with bad bytes simply won't match
            tracing::warn!("{} is not valid UTF-8, replacing invalid bytes", path);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(parse_id_list(&contents))
}

fn parse_id_list(contents: &str) -> IndexSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn write_id_list(path: &Utf8Path, header: &str, ids: &[String]) -> io::Result<()> {
    let mut contents = String::from(header);
    contents.push('\n');
    for id in ids {
        contents.push_str(id);
        contents.push('\n');
    }
    write_atomic_text(path, &contents)?;
    tracing::debug!("Wrote {} ids to {}", ids.len(), path);
    Ok(())
}
