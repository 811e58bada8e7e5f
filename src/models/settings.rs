use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Persisted user configuration from `settings.yaml`
///
/// Holds the Transport Fever mods directory. Keys this version does not know
/// about are carried through `extra` so a round trip never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "TpfModPath", default)]
    pub tpf_mod_path: String,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

impl Settings {
    /// Settings pointing at an already-validated mods directory.
    pub fn with_mods_path(path: &Utf8Path) -> Self {
        Self {
            tpf_mod_path: path.to_string(),
            extra: IndexMap::new(),
        }
    }

    /// The configured mods directory, or `None` on first run.
    pub fn mods_path(&self) -> Option<&Utf8Path> {
        if self.tpf_mod_path.trim().is_empty() {
            None
        } else {
            Some(Utf8Path::new(&self.tpf_mod_path))
        }
    }
}
