use camino::Utf8PathBuf;

/// How a mod package is stored in the mods directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Directory,
    Archive,
}

/// Fields read from a package's `mod.lua`
///
/// Everything is optional; a missing or unparsable `mod.lua` yields the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub minor_version: Option<u32>,
}

/// One discovered mod package
///
/// Owned by [`ModRegistry`](crate::services::ModRegistry). `id` is the
/// package's file name in the mods directory and is unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub id: String,
    pub display_name: String,
    pub source_path: Utf8PathBuf,
    pub kind: PackageKind,
    pub enabled: bool,
    /// Position in the catalog; enabled mods load in ascending order.
    pub load_order: usize,
    pub metadata: ModMetadata,
}

impl ModEntry {
    /// Major version from the Transport Fever folder convention `author_name_<major>`.
    pub fn major_version(&self) -> Option<u32> {
        let stem = self.id.strip_suffix(".zip").unwrap_or(&self.id);
        let (_, suffix) = stem.rsplit_once('_')?;
        suffix.parse().ok()
    }

    /// `major.minor` when both are known.
    pub fn version_label(&self) -> Option<String> {
        let major = self.major_version()?;
        Some(match self.metadata.minor_version {
            Some(minor) => format!("{major}.{minor}"),
            None => major.to_string(),
        })
    }
}
