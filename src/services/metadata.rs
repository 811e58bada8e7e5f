//! Reading `mod.lua` from mod packages.
//!
//! Transport Fever describes each mod in a Lua file whose `data()` function
//! returns an `info` table, e.g.
//!
//! ```lua
//! function data()
//! return {
//!   info = {
//!     minorVersion = 2,
//!     severityAdd = "NONE",
//!     name = _("Awesome Trains"),
//!     description = _("More trains."),
//!   },
//! }
//! end
//! ```
//!
//! The Lua is not executed; string literals are picked out with regexes. Any
//! failure here degrades to an empty [`ModMetadata`] for that one package.

use crate::models::ModMetadata;
use camino::Utf8Path;
use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use zip::ZipArchive;

/// Marker file that makes a folder or archive a mod package
pub const MOD_MARKER_FILE: &str = "mod.lua";

/// Upper bound on how much of a `mod.lua` is read
const MAX_MARKER_BYTES: u64 = 1024 * 1024;

/// Extracts [`ModMetadata`] from `mod.lua` contents
///
/// Patterns are compiled once at construction.
pub struct MetadataReader {
    /// Start of the `info = {` table
    info_pattern: Regex,

    /// `name = "..."` or `name = _("...")`
    name_pattern: Regex,

    /// `description = "..."` or `description = _("...")`
    description_pattern: Regex,

    /// `minorVersion = <n>`
    minor_version_pattern: Regex,
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReader {
    pub fn new() -> Self {
        Self {
            info_pattern: Regex::new(r"\binfo\s*=\s*\{").expect("Invalid info regex"),
            name_pattern: string_field_pattern("name"),
            description_pattern: string_field_pattern("description"),
            minor_version_pattern: Regex::new(r"\bminorVersion\s*=\s*(\d+)")
                .expect("Invalid minorVersion regex"),
        }
    }

    /// Parse the text of a `mod.lua`.
    ///
    /// Fields are taken from the top level of the `info` table, so a `name`
    /// inside `authors` or `tags` is not mistaken for the mod's name. Without
    /// an `info` table the whole file is searched.
    pub fn parse(&self, source: &str) -> ModMetadata {
        let info = self.info_top_level(source);
        let scope = info.as_deref().unwrap_or(source);
        ModMetadata {
            name: capture_string(&self.name_pattern, scope),
            description: capture_string(&self.description_pattern, scope),
            minor_version: self
                .minor_version_pattern
                .captures(scope)
                .and_then(|caps| caps[1].parse().ok()),
        }
    }

    /// Text directly inside `info = { ... }`, with nested tables blanked out.
    fn info_top_level(&self, source: &str) -> Option<String> {
        let start = self.info_pattern.find(source)?.end();
        Some(top_level_of_table(&source[start..]))
    }

    /// Read metadata from an unpacked mod folder.
    pub fn read_directory(&self, package_dir: &Utf8Path) -> ModMetadata {
        let marker = package_dir.join(MOD_MARKER_FILE);
        match read_limited(&marker) {
            Ok(source) => self.parse(&source),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", marker, e);
                ModMetadata::default()
            }
        }
    }

    /// Read metadata from a zipped mod.
    pub fn read_archive(&self, archive_path: &Utf8Path) -> ModMetadata {
        match read_archive_marker(archive_path) {
            Ok(Some(source)) => self.parse(&source),
            Ok(None) => ModMetadata::default(),
            Err(e) => {
                tracing::warn!(
                    "Could not read {} from {}: {}",
                    MOD_MARKER_FILE,
                    archive_path,
                    e
                );
                ModMetadata::default()
            }
        }
    }
}

/// True if `dir` directly contains a `mod.lua` file.
pub fn directory_has_marker(dir: &Utf8Path) -> bool {
    dir.join(MOD_MARKER_FILE).is_file()
}

/// Locate `mod.lua` inside a zip, either at the root or one folder deep.
///
/// Returns `Ok(None)` for a readable archive without a marker, `Err` if the
/// file is not a readable zip.
pub fn archive_marker_entry(archive_path: &Utf8Path) -> zip::result::ZipResult<Option<String>> {
    let file = File::open(archive_path)?;
    let archive = ZipArchive::new(file)?;
    Ok(find_marker_entry(archive.file_names()))
}

fn find_marker_entry<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut nested = None;
    for name in names {
        let name_normalized = name.replace('\\', "/");
        let depth = name_normalized.matches('/').count();
        if name_normalized == MOD_MARKER_FILE {
            return Some(name.to_string());
        }
        if depth == 1
            && name_normalized.ends_with(&format!("/{MOD_MARKER_FILE}"))
            && nested.is_none()
        {
            nested = Some(name.to_string());
        }
    }
    nested
}

/// Collect the text of a table body up to its closing brace, skipping nested
/// tables. `body` starts just after the opening `{`. Braces inside string
/// literals and `--` line comments do not count. An unclosed table yields
/// everything read.
fn top_level_of_table(body: &str) -> String {
    let mut top = String::new();
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if depth == 1 {
                top.push(c);
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                if depth == 1 {
                    top.push(c);
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
                if depth == 1 {
                    top.push('\n');
                }
            }
            '{' => {
                if depth == 1 {
                    top.push(' ');
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return top;
                }
                if depth == 1 {
                    top.push(' ');
                }
            }
            _ if depth == 1 => top.push(c),
            _ => {}
        }
    }
    top
}

fn read_archive_marker(archive_path: &Utf8Path) -> zip::result::ZipResult<Option<String>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let Some(entry_name) = find_marker_entry(archive.file_names()) else {
        return Ok(None);
    };

    let entry = archive.by_name(&entry_name)?;
    let mut bytes = Vec::new();
    entry.take(MAX_MARKER_BYTES).read_to_end(&mut bytes)?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn read_limited(path: &Utf8Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.take(MAX_MARKER_BYTES).read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn string_field_pattern(field: &str) -> Regex {
    let pattern = format!(r#"\b{field}\s*=\s*(?:_\(\s*)?"((?:[^"\\]|\\.)*)""#);
    Regex::new(&pattern).expect("Invalid mod.lua field regex")
}

fn capture_string(pattern: &Regex, source: &str) -> Option<String> {
    let caps = pattern.captures(source)?;
    let value = unescape_lua(&caps[1]);
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn unescape_lua(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
