//! Services module - Mod directory validation, discovery and state tracking.
//!
//! Everything here is framework-agnostic: no UI code, only filesystem work
//! that a presentation layer reaches through [`ModManager`](crate::manager::ModManager).
//!
//! # Components
//!
//! - [`ModDirectoryResolver`]: Validates and normalizes a candidate mods directory
//!   - Existence and listability checks
//!   - The advisory "folder is named `mods`" check ([`ValidationError::LooksWrong`])
//!
//! - [`ModRegistry`]: The in-memory catalog of one mods directory
//!   - Scans immediate children for packages holding a `mod.lua`
//!   - Enable, disable and reorder, written to disk before memory changes
//!
//! - [`MetadataReader`]: Pulls `name`, `description` and `minorVersion` out of `mod.lua`
//!
//! - [`bookkeeping`]: The enabled manifest and order files inside the mods directory,
//!   behind the [`BookkeepingWriter`] seam
//!
//! # On-disk layout
//!
//! ```text
//! mods/
//! ├── AwesomeTrains/mod.lua
//! ├── BetterSignals_1/mod.lua
//! ├── Packed_2.zip            (contains mod.lua or Packed_2/mod.lua)
//! ├── tpfmm_enabled.txt       (enabled ids)
//! └── tpfmm_order.txt         (load order)
//! ```

pub mod bookkeeping;
pub mod metadata;
pub mod registry;
pub mod resolver;

pub use bookkeeping::{BookkeepingWriter, FsBookkeeping};
pub use metadata::MetadataReader;
pub use registry::{Catalog, ModRegistry, MutationError, ScanError};
pub use resolver::{ModDirectoryResolver, ValidationError};
