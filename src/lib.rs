// TPF-ModManager - Mod management for Transport Fever
//
// This is the library crate containing mod directory validation, discovery and
// enabled-state tracking. The binary crate (main.rs) provides a command-line front end.

pub mod config;
mod fs_atomic;
pub mod logging;
pub mod manager;
pub mod models;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{PersistenceError, SettingsStore};
pub use manager::{ModManager, SetupError};
pub use models::{ModEntry, ModMetadata, PackageKind, Settings};
pub use services::{ModDirectoryResolver, ModRegistry, MutationError, ScanError, ValidationError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Window and banner title
pub const APP_TITLE: &str = "TPF-ModManager";
