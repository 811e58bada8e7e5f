//! Validation and normalization of a candidate mods directory.
//!
//! Checks run in order and stop at the first failure:
//! 1. the path exists and is a directory ([`ValidationError::NotFound`])
//! 2. the directory can be listed ([`ValidationError::NotAccessible`])
//! 3. the last path segment is `mods` ([`ValidationError::LooksWrong`], advisory)
//!
//! Nothing here writes to disk.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use thiserror::Error;

/// Folder name Transport Fever uses for its mods directory
pub const MODS_DIR_NAME: &str = "mods";

/// Reasons a candidate path was not accepted as a mods directory
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Directory not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("Directory not accessible: {path}: {source}")]
    NotAccessible {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// The directory is usable but is not named like the game's mods folder.
    /// Carries the normalized path so the caller may still accept it.
    #[error("{path} does not look like Transport Fever's 'mods' folder")]
    LooksWrong { path: Utf8PathBuf },
}

impl ValidationError {
    /// True for the advisory naming mismatch, false for hard failures.
    pub fn is_advisory(&self) -> bool {
        matches!(self, ValidationError::LooksWrong { .. })
    }
}

/// Validates candidate mods directories
#[derive(Debug, Clone)]
pub struct ModDirectoryResolver {
    expected_dir_name: String,
}

impl Default for ModDirectoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModDirectoryResolver {
    pub fn new() -> Self {
        Self {
            expected_dir_name: MODS_DIR_NAME.to_string(),
        }
    }

    /// Validate `candidate` and return it normalized (absolute, no `.`/`..`
    /// segments, no trailing separator).
    ///
    /// # Errors
    ///
    /// See the module docs for the order of checks.
    pub fn validate(&self, candidate: &str) -> Result<Utf8PathBuf, ValidationError> {
        let path = normalize(candidate)?;

        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(ValidationError::NotFound(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ValidationError::NotFound(path));
            }
            Err(source) => return Err(ValidationError::NotAccessible { path, source }),
        }

        if let Err(source) = fs::read_dir(&path) {
            return Err(ValidationError::NotAccessible { path, source });
        }

        if path.file_name() != Some(self.expected_dir_name.as_str()) {
            tracing::debug!("Candidate {} fails the mods folder name check", path);
            return Err(ValidationError::LooksWrong { path });
        }

        tracing::debug!("Validated mods directory {}", path);
        Ok(path)
    }
}

/// Make `candidate` absolute and resolve `.`/`..` lexically.
///
/// Symlinks are not followed, so two spellings of the same directory through
/// different links stay distinct.
pub fn normalize(candidate: &str) -> Result<Utf8PathBuf, ValidationError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NotFound(Utf8PathBuf::new()));
    }

    let absolute =
        std::path::absolute(trimmed).map_err(|source| ValidationError::NotAccessible {
            path: Utf8PathBuf::from(trimmed),
            source,
        })?;
    let absolute =
        Utf8PathBuf::try_from(absolute).map_err(|e| ValidationError::NotAccessible {
            path: Utf8PathBuf::from(trimmed),
            source: io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
        })?;

    Ok(clean_components(&absolute))
}

fn clean_components(path: &Utf8Path) -> Utf8PathBuf {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}
