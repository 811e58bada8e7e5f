use crate::fs_atomic::write_atomic_text;
use crate::models::Settings;
use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use std::fs;
use std::io;
use thiserror::Error;

/// File name of the settings file inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

/// Errors that can occur while persisting settings
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    #[error("Failed to write settings to {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine a per-user configuration directory")]
    NoConfigDir,
}

/// Loads and saves the user [`Settings`] file.
///
/// The file is YAML and lives at `<config_dir>/settings.yaml`. Loading never
/// fails: a missing or unreadable file is treated as a first run. Saving is
/// atomic and reports failures to the caller.
///
/// Assumes a single writer; concurrent instances get last-writer-wins.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl SettingsStore {
    /// Create a SettingsStore rooted at `config_dir`.
    ///
    /// The directory is created on first save, not here.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            settings_path: config_dir.join(SETTINGS_FILE_NAME),
            config_dir,
        }
    }

    /// Create a SettingsStore at the platform's per-user config location
    /// (e.g. `~/.config/tpfmm` on Linux, `%APPDATA%\tpfmm\config` on Windows).
    pub fn user_default() -> Result<Self, PersistenceError> {
        let dirs =
            ProjectDirs::from("", "", crate::APP_NAME).ok_or(PersistenceError::NoConfigDir)?;
        let config_dir = Utf8PathBuf::try_from(dirs.config_dir().to_path_buf())
            .map_err(|_| PersistenceError::NoConfigDir)?;
        Ok(Self::new(config_dir))
    }

    /// Load the settings file.
    ///
    /// # Returns
    /// The stored Settings, or defaults (empty mods path) if the file is
    /// absent, unreadable, or not valid YAML
    pub fn load(&self) -> Settings {
        let file_contents = match fs::read_to_string(&self.settings_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "Settings file not found at {}, starting with defaults",
                    self.settings_path
                );
                return Settings::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read settings from {}: {}, using defaults",
                    self.settings_path,
                    e
                );
                return Settings::default();
            }
        };

        if file_contents.trim().is_empty() {
            tracing::info!("Settings file {} is empty, using defaults", self.settings_path);
            return Settings::default();
        }

        match serde_yaml_ng::from_str::<Settings>(&file_contents) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", self.settings_path);
                settings
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse settings {}: {}, using defaults",
                    self.settings_path,
                    e
                );
                Settings::default()
            }
        }
    }

    /// Save the settings file atomically.
    ///
    /// # Arguments
    /// * `settings` - The Settings to save
    pub fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        let yaml_string = serde_yaml_ng::to_string(settings)?;

        fs::create_dir_all(&self.config_dir).map_err(|source| PersistenceError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        write_atomic_text(&self.settings_path, &yaml_string).map_err(|source| {
            PersistenceError::Io {
                path: self.settings_path.clone(),
                source,
            }
        })?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (SettingsStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let store = SettingsStore::new(&config_path);
        (store, temp_dir)
    }

    #[test]
    fn test_new_does_not_touch_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().join("nested")).unwrap();
        let store = SettingsStore::new(&config_path);

        assert!(!config_path.exists());
        assert_eq!(store.settings_path(), config_path.join(SETTINGS_FILE_NAME));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_load_save_settings() {
        let (store, _temp_dir) = create_test_store();

        let settings = Settings::with_mods_path(Utf8Path::new("/games/tpf/mods"));
        store.save(&settings).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.mods_path(), Some(Utf8Path::new("/games/tpf/mods")));
    }

    #[test]
    fn test_save_creates_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().join("a").join("b")).unwrap();
        let store = SettingsStore::new(&config_path);

        store.save(&Settings::default()).unwrap();
        assert!(store.settings_path().exists());
    }

    #[test]
    fn test_corrupt_file_returns_defaults() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.settings_path(), "TpfModPath: [unterminated").unwrap();

        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_save_fails_when_config_dir_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = Utf8PathBuf::try_from(temp_dir.path().join("blocker")).unwrap();
        fs::write(&blocker, "not a directory").unwrap();
        let store = SettingsStore::new(&blocker);

        let result = store.save(&Settings::default());
        assert!(matches!(result, Err(PersistenceError::Io { .. })));
    }
}
