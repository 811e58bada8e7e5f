// Mod manager
//
// The single entry point a presentation layer talks to. Owns the settings
// store, the loaded Settings and one ModRegistry, and sequences
// validate -> scan -> persist so that a failure never leaves half an update.

use crate::config::{PersistenceError, SettingsStore};
use crate::models::{ModEntry, Settings};
use crate::services::{
    ModDirectoryResolver, ModRegistry, MutationError, ScanError, ValidationError,
};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors from [`ModManager::set_mods_path`]
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Orchestrates settings, directory validation and the mod catalog
///
/// Construct one per process and hand it to whatever drives the UI; there is
/// no global instance.
///
/// # Usage
///
/// ```ignore
/// let mut manager = ModManager::new(SettingsStore::user_default()?);
/// if manager.mods_path().is_none() {
///     let folder = ask_user_for_folder();
///     manager.set_mods_path(&folder)?;
/// } else {
///     manager.refresh()?;
/// }
/// manager.enable("AwesomeTrains")?;
/// ```
///
/// # Threading
///
/// Every call runs to completion on the caller's thread and may block on
/// disk I/O. There is no internal locking: callers must not use one manager
/// from several threads at once.
///
/// # Related Types
///
/// - [`SettingsStore`]: Where the mods path is persisted
/// - [`ModDirectoryResolver`]: Decides whether a candidate path is acceptable
/// - [`ModRegistry`]: Holds the catalog and performs mutations
pub struct ModManager {
    store: SettingsStore,
    resolver: ModDirectoryResolver,
    settings: Settings,
    registry: ModRegistry,
}

impl ModManager {
    /// Create a manager, loading settings from `store`.
    ///
    /// Does not scan; call [`refresh`](Self::refresh) once a path is known.
    pub fn new(store: SettingsStore) -> Self {
        Self::with_registry(store, ModRegistry::new())
    }

    /// Create a manager around an existing registry.
    pub fn with_registry(store: SettingsStore, registry: ModRegistry) -> Self {
        let settings = store.load();
        Self {
            store,
            resolver: ModDirectoryResolver::new(),
            settings,
            registry,
        }
    }

    /// The last successfully configured mods directory, or `None` if unset.
    pub fn mods_path(&self) -> Option<&Utf8Path> {
        self.settings.mods_path()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate `candidate`, scan it, persist it and return the new catalog.
    ///
    /// A folder not named `mods` is rejected with
    /// [`ValidationError::LooksWrong`]. On any error the stored settings and
    /// the current catalog are unchanged.
    pub fn set_mods_path(&mut self, candidate: &str) -> Result<Vec<ModEntry>, SetupError> {
        let path = self.resolver.validate(candidate)?;
        self.adopt_mods_path(path)
    }

    /// Like [`set_mods_path`](Self::set_mods_path), but a folder with an
    /// unexpected name is accepted with a warning.
    pub fn set_mods_path_allowing_unconventional(
        &mut self,
        candidate: &str,
    ) -> Result<Vec<ModEntry>, SetupError> {
        let path = match self.resolver.validate(candidate) {
            Ok(path) => path,
            Err(ValidationError::LooksWrong { path }) => {
                tracing::warn!("Using {} even though it is not named 'mods'", path);
                path
            }
            Err(e) => return Err(e.into()),
        };
        self.adopt_mods_path(path)
    }

    fn adopt_mods_path(&mut self, path: Utf8PathBuf) -> Result<Vec<ModEntry>, SetupError> {
        let catalog = self.registry.discover(&path)?;

        let mut settings = self.settings.clone();
        settings.tpf_mod_path = path.to_string();
        self.store.save(&settings)?;

        self.settings = settings;
        self.registry.install(catalog);
        tracing::info!("Mods directory set to {}", path);
        Ok(self.registry.current())
    }

    /// Rescan the configured mods directory.
    ///
    /// A failing scan leaves both the settings and the previous catalog in place.
    pub fn refresh(&mut self) -> Result<Vec<ModEntry>, ScanError> {
        let path = self
            .mods_path()
            .map(Utf8Path::to_path_buf)
            .ok_or(ScanError::NoPathConfigured)?;
        self.registry.scan(&path)
    }

    pub fn enable(&mut self, id: &str) -> Result<(), MutationError> {
        self.registry.enable(id)
    }

    pub fn disable(&mut self, id: &str) -> Result<(), MutationError> {
        self.registry.disable(id)
    }

    pub fn reorder(&mut self, new_order: &[String]) -> Result<(), MutationError> {
        self.registry.reorder(new_order)
    }

    /// Point-in-time copy of the catalog.
    pub fn mods(&self) -> Vec<ModEntry> {
        self.registry.current()
    }

    pub fn registry(&self) -> &ModRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Utf8PathBuf, SettingsStore) {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let store = SettingsStore::new(root.join("config"));
        (temp_dir, root, store)
    }

    fn add_mod(mods_path: &Utf8Path, id: &str) {
        let dir = mods_path.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("mod.lua"), "").unwrap();
    }

    #[test]
    fn test_first_run_has_no_path() {
        let (_temp_dir, _root, store) = setup();
        let manager = ModManager::new(store);
        assert!(manager.mods_path().is_none());
        assert!(manager.mods().is_empty());
    }

    #[test]
    fn test_refresh_without_path() {
        let (_temp_dir, _root, store) = setup();
        let mut manager = ModManager::new(store);
        assert!(matches!(manager.refresh(), Err(ScanError::NoPathConfigured)));
    }

    #[test]
    fn test_looks_wrong_is_not_persisted() {
        let (_temp_dir, root, store) = setup();
        let other = root.join("MyMods");
        fs::create_dir(&other).unwrap();
        let mut manager = ModManager::new(store.clone());

        let result = manager.set_mods_path(other.as_str());

        assert!(matches!(
            result,
            Err(SetupError::Validation(ValidationError::LooksWrong { .. }))
        ));
        assert!(manager.mods_path().is_none());
        assert!(!store.settings_path().exists());
    }

    #[test]
    fn test_unconventional_path_can_be_forced() {
        let (_temp_dir, root, store) = setup();
        let other = root.join("MyMods");
        add_mod(&other, "A");
        let mut manager = ModManager::new(store.clone());

        let mods = manager
            .set_mods_path_allowing_unconventional(other.as_str())
            .unwrap();

        assert_eq!(mods.len(), 1);
        assert_eq!(manager.mods_path(), Some(other.as_path()));
        assert_eq!(store.load().mods_path(), Some(other.as_path()));
    }

    #[test]
    fn test_persistence_failure_keeps_previous_state() {
        let (_temp_dir, root, _store) = setup();
        let blocker = root.join("blocker");
        fs::write(&blocker, "").unwrap();
        let mods_path = root.join("mods");
        add_mod(&mods_path, "A");
        let mut manager = ModManager::new(SettingsStore::new(&blocker));

        let result = manager.set_mods_path(mods_path.as_str());

        assert!(matches!(result, Err(SetupError::Persistence(_))));
        assert!(manager.mods_path().is_none());
        assert!(manager.mods().is_empty());
    }

    #[test]
    fn test_extra_settings_keys_survive_set_path() {
        let (_temp_dir, root, store) = setup();
        fs::create_dir_all(store.config_dir()).unwrap();
        fs::write(store.settings_path(), "TpfModPath: ''\nTheme: dark\n").unwrap();
        let mods_path = root.join("mods");
        fs::create_dir(&mods_path).unwrap();
        let mut manager = ModManager::new(store.clone());

        manager.set_mods_path(mods_path.as_str()).unwrap();

        let written = fs::read_to_string(store.settings_path()).unwrap();
        assert!(written.contains("Theme: dark"));
        assert!(manager.settings().extra.contains_key("Theme"));
    }

    #[test]
    fn test_settings_and_registry_follow_set_path() {
        let (_temp_dir, root, store) = setup();
        let mods_path = root.join("mods");
        fs::create_dir(&mods_path).unwrap();
        let mut manager = ModManager::new(store);

        manager.set_mods_path(mods_path.as_str()).unwrap();

        assert_eq!(manager.settings().tpf_mod_path, mods_path.as_str());
        assert_eq!(manager.registry().mods_path(), Some(mods_path.as_path()));
        assert!(manager.registry().current().is_empty());
    }
}
