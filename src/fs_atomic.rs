// Atomic file replacement
//
// Every file this crate writes (settings, enabled manifest, order file) goes
// through here so a crash mid-write leaves either the old or the new contents.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Write `contents` to `path` via a sibling temp file and a rename.
///
/// The parent directory must already exist.
pub(crate) fn write_atomic_text(path: &Utf8Path, contents: &str) -> io::Result<()> {
    let temp_path = temp_path_for(path)?;

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("no parent for {path}"))
    })?;
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("no file name in {path}"))
    })?;

    let temp_path = parent.join(format!("{file_name}.tmp"));
    if !temp_path.exists() {
        return Ok(temp_path);
    }

    // A leftover temp file from an interrupted write; don't reuse it.
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    Ok(parent.join(format!("{file_name}.{stamp}.tmp")))
}
