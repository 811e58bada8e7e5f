//! Integration tests for ModManager
//!
//! These tests walk the flows a front end drives:
//! - First run: no path, set a path, get the catalog
//! - Invalid or stale paths never silently rewrite settings
//! - Enable/disable/reorder persist across a refresh and a restart

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;
use tpfmm::{
    ModManager, MutationError, ScanError, SettingsStore, SetupError, ValidationError,
};

struct Fixture {
    _temp_dir: TempDir,
    root: Utf8PathBuf,
    config_dir: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let config_dir = root.join("config");
        Self {
            _temp_dir: temp_dir,
            root,
            config_dir,
        }
    }

    fn store(&self) -> SettingsStore {
        SettingsStore::new(&self.config_dir)
    }

    fn manager(&self) -> ModManager {
        ModManager::new(self.store())
    }

    fn mods_dir(&self, mods: &[&str]) -> Utf8PathBuf {
        let mods_path = self.root.join("games").join("tpf").join("mods");
        fs::create_dir_all(&mods_path).unwrap();
        for id in mods {
            add_mod(&mods_path, id);
        }
        mods_path
    }
}

fn add_mod(mods_path: &Utf8Path, id: &str) {
    let dir = mods_path.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("mod.lua"), format!("info = {{ name = _(\"{id}\") }}")).unwrap();
}

#[test]
fn test_first_run_scenario() {
    let fixture = Fixture::new();
    fs::create_dir_all(&fixture.config_dir).unwrap();
    fs::write(fixture.store().settings_path(), "").unwrap();
    let mods_path = fixture.mods_dir(&["BetterSignals", "AwesomeTrains"]);

    let mut manager = fixture.manager();
    assert!(manager.mods_path().is_none());

    let mods = manager.set_mods_path(mods_path.as_str()).unwrap();

    assert_eq!(mods.len(), 2);
    assert_eq!(mods[0].id, "AwesomeTrains");
    assert_eq!(mods[1].id, "BetterSignals");
    assert!(mods.iter().all(|m| !m.enabled));
    assert_eq!(mods[0].load_order, 0);
    assert_eq!(mods[1].load_order, 1);
    assert_eq!(manager.mods_path(), Some(mods_path.as_path()));

    // Persisted for the next run
    assert_eq!(fixture.manager().mods_path(), Some(mods_path.as_path()));
}

#[test]
fn test_set_missing_path_is_not_found_and_keeps_settings() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();

    let result = manager.set_mods_path(fixture.root.join("nowhere").join("mods").as_str());

    assert!(matches!(
        result,
        Err(SetupError::Validation(ValidationError::NotFound(_)))
    ));
    assert_eq!(manager.mods_path(), Some(mods_path.as_path()));
    assert_eq!(manager.mods().len(), 1);
    assert_eq!(fixture.store().load().mods_path(), Some(mods_path.as_path()));
}

#[test]
fn test_stale_path_refresh_fails_without_touching_settings() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A"]);
    fixture
        .store()
        .save(&tpfmm::Settings::with_mods_path(&mods_path))
        .unwrap();
    fs::remove_dir_all(&mods_path).unwrap();

    let mut manager = fixture.manager();
    let result = manager.refresh();

    assert!(matches!(
        result,
        Err(ScanError::NotFound(_)) | Err(ScanError::NotAccessible { .. })
    ));
    assert_eq!(manager.mods_path(), Some(mods_path.as_path()));
    assert_eq!(fixture.store().load().mods_path(), Some(mods_path.as_path()));
}

#[test]
fn test_enable_then_refresh() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["AwesomeTrains", "BetterSignals"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();

    manager.enable("BetterSignals").unwrap();
    let mods = manager.refresh().unwrap();
    let signals = mods.iter().find(|m| m.id == "BetterSignals").unwrap();
    assert!(signals.enabled);

    manager.disable("BetterSignals").unwrap();
    let mods = manager.refresh().unwrap();
    let signals = mods.iter().find(|m| m.id == "BetterSignals").unwrap();
    assert!(!signals.enabled);
}

#[test]
fn test_enable_is_idempotent() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();

    manager.enable("A").unwrap();
    let snapshot = manager.mods();
    let manifest = fs::read_to_string(mods_path.join("tpfmm_enabled.txt")).unwrap();

    manager.enable("A").unwrap();

    assert_eq!(manager.mods(), snapshot);
    assert_eq!(
        fs::read_to_string(mods_path.join("tpfmm_enabled.txt")).unwrap(),
        manifest
    );
}

#[test]
fn test_stale_id_is_not_found() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();

    // Added on disk after the scan: unknown until refresh
    add_mod(&mods_path, "B");
    assert!(matches!(manager.enable("B"), Err(MutationError::NotFound(_))));

    manager.refresh().unwrap();
    manager.enable("B").unwrap();
}

#[test]
fn test_reorder_survives_restart() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A", "B", "C"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();

    let order: Vec<String> = ["B", "C", "A"].iter().map(|s| s.to_string()).collect();
    manager.reorder(&order).unwrap();

    let mut restarted = fixture.manager();
    let mods = restarted.refresh().unwrap();
    let ids: Vec<&str> = mods.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "C", "A"]);
    assert_eq!(
        mods.iter().map(|m| m.load_order).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn test_reorder_missing_id_keeps_order() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&["A", "B", "C"]);
    let mut manager = fixture.manager();
    manager.set_mods_path(mods_path.as_str()).unwrap();
    let before = manager.mods();

    let result = manager.reorder(&["A".to_string(), "B".to_string()]);

    assert!(matches!(result, Err(MutationError::InvalidPermutation(_))));
    assert_eq!(manager.mods(), before);
}

#[test]
fn test_trailing_separator_is_normalized() {
    let fixture = Fixture::new();
    let mods_path = fixture.mods_dir(&[]);
    let mut manager = fixture.manager();

    manager.set_mods_path(&format!("{}/", mods_path)).unwrap();

    assert_eq!(manager.mods_path(), Some(mods_path.as_path()));
}
