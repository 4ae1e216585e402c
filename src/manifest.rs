//! Registry manifest transforms.
//!
//! The registry keeps one table per extension in `extensions.toml`:
//!
//! ```toml
//! [my-extension]
//! submodule = "extensions/my-extension"
//! version = "0.1.2"
//! ```
//!
//! A release bumps `version` in the extension's table and drops any stale
//! `revision` pin, leaving the rest of the file byte-for-byte intact.

use serde::Serialize;
use toml_edit::{DocumentMut, Value};

/// Path of the manifest file inside the registry repository.
pub const MANIFEST_PATH: &str = "extensions.toml";

/// Errors that can occur while editing the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest is not valid TOML: {0}")]
    Parse(#[from] toml_edit::TomlError),

    #[error("manifest has no entry for extension '{0}'")]
    MissingEntry(String),
}

/// The content transform for one release: bump `extension_name` to `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBump {
    pub extension_name: String,
    pub version: String,
}

impl ManifestBump {
    pub fn new(extension_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            extension_name: extension_name.into(),
            version: version.into(),
        }
    }

    /// Apply the bump to the current manifest content.
    ///
    /// Updates the version first, then removes the revision line from this
    /// extension's table. Other entries keep their pins.
    pub fn apply(&self, content: &str) -> Result<String, ManifestError> {
        let updated = update_version(content, &self.extension_name, &self.version)?;
        Ok(map_entry(&updated, &self.extension_name, remove_revision_line))
    }
}

/// Set `version` in the `[name]` table, inserting the key if it is missing.
pub fn update_version(content: &str, name: &str, version: &str) -> Result<String, ManifestError> {
    let mut doc: DocumentMut = content.parse()?;

    let table = doc
        .get_mut(name)
        .and_then(|item| item.as_table_like_mut())
        .ok_or_else(|| ManifestError::MissingEntry(name.to_string()))?;

    match table.get_mut("version").and_then(|item| item.as_value_mut()) {
        Some(existing) => {
            let decor = existing.decor().clone();
            *existing = Value::from(version);
            *existing.decor_mut() = decor;
        }
        None => {
            table.insert("version", toml_edit::value(version));
        }
    }

    Ok(doc.to_string())
}

/// Drop every `revision = ...` line in `content`.
pub fn remove_revision_line(content: &str) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| !is_revision_line(line))
        .collect()
}

fn is_revision_line(line: &str) -> bool {
    line.trim_start()
        .strip_prefix("revision")
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

/// Run `f` over the lines of the `[name]` table; everything else passes through.
fn map_entry(content: &str, name: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(content.len());
    let mut entry = String::new();
    let mut in_entry = false;

    for line in content.split_inclusive('\n') {
        if let Some(header) = table_header(line) {
            if in_entry {
                out.push_str(&f(&entry));
                entry.clear();
            }
            in_entry = header == name;
        }
        if in_entry {
            entry.push_str(line);
        } else {
            out.push_str(line);
        }
    }
    if in_entry {
        out.push_str(&f(&entry));
    }

    out
}

/// The key of a `[table]` header line, unquoted. An `[[array]]` header maps to
/// an empty key so it still ends the current table.
fn table_header(line: &str) -> Option<&str> {
    let inner = line.trim_start().strip_prefix('[')?;
    if inner.starts_with('[') {
        return Some("");
    }
    let key = inner[..inner.find(']')?].trim();
    Some(
        key.strip_prefix('"')
            .and_then(|k| k.strip_suffix('"'))
            .or_else(|| key.strip_prefix('\'').and_then(|k| k.strip_suffix('\'')))
            .unwrap_or(key),
    )
}
