//! Data models for the mod manager.
//!
//! - [`Settings`]: The persisted user configuration (`settings.yaml`), currently the mods path
//! - [`ModEntry`]: One discovered mod package with its enabled flag and load order
//! - [`ModMetadata`]: The optional fields read from a package's `mod.lua`
//! - [`PackageKind`]: Whether a package is an unpacked folder or a `.zip` archive
//!
//! # Architecture Note
//!
//! The models are plain data:
//! - **Serializable**: [`Settings`] derives `Serialize`/`Deserialize` for YAML persistence
//! - **Cloneable**: catalogs are handed out as point-in-time copies of `Vec<ModEntry>`
//! - **Owned elsewhere**: mutation goes through [`ModManager`](crate::manager::ModManager)

pub mod mod_entry;
pub mod settings;

pub use mod_entry::{ModEntry, ModMetadata, PackageKind};
pub use settings::Settings;
