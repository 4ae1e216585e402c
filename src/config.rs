//! Action inputs.
//!
//! Inputs are layered, highest precedence first:
//!
//! 1. Command-line flags.
//! 2. GitHub Actions inputs (`INPUT_<NAME>` environment variables).
//! 3. A TOML file: `--config <path>`, or `<config dir>/zed-extension-action/config.toml`
//!    when it exists.
//!
//! Empty values count as absent at every layer, the same way an unset
//! action input reads as the empty string.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The named inputs of a run.
///
/// Everything is optional here; which inputs are required and what the
/// others default to is decided by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Inputs {
    /// Release tag. Defaults to the tag in the triggering ref.
    pub tag_name: Option<String>,

    /// Registry repository as `owner/repo`. Required.
    pub zed_extensions: Option<String>,

    /// Repository to push to as `owner/repo`.
    /// Defaults to the triggering repository when it is the registry itself,
    /// otherwise the collaborator picks (target or a fork).
    pub push_to: Option<String>,

    /// Extension name. Defaults to the triggering repository's name, lower-cased.
    pub extension_name: Option<String>,

    /// Base branch in the registry. Defaults to its default branch.
    pub base_branch: Option<String>,

    /// Submodule path in the registry. Defaults to `extensions/<extension name>`.
    pub extension_path: Option<String>,

    /// Commit message template. Required.
    pub commit_message: Option<String>,

    /// Whether to open a pull request: `true` or `false`.
    /// Absent leaves the choice to the collaborator.
    pub create_pullrequest: Option<String>,
}

impl Inputs {
    /// Read GitHub Actions inputs from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read GitHub Actions inputs through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let input = |name: &str| lookup(&input_var(name)).and_then(normalize);

        Self {
            tag_name: input("tag-name"),
            zed_extensions: input("zed-extensions"),
            push_to: input("push-to"),
            extension_name: input("extension-name"),
            base_branch: input("base-branch"),
            extension_path: input("extension-path"),
            commit_message: input("commit-message"),
            create_pullrequest: input("create-pullrequest"),
        }
    }

    /// Load inputs from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let inputs: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        Ok(inputs.normalized())
    }

    /// Load the config file layer.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// only if present.
    pub fn from_config_file(explicit: Option<&Path>) -> Result<Self, String> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("loading inputs from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// The default config file path: `<config dir>/zed-extension-action/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("zed-extension-action").join("config.toml"))
    }

    /// Fill anything unset in `self` from `lower`.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            tag_name: self.tag_name.or(lower.tag_name),
            zed_extensions: self.zed_extensions.or(lower.zed_extensions),
            push_to: self.push_to.or(lower.push_to),
            extension_name: self.extension_name.or(lower.extension_name),
            base_branch: self.base_branch.or(lower.base_branch),
            extension_path: self.extension_path.or(lower.extension_path),
            commit_message: self.commit_message.or(lower.commit_message),
            create_pullrequest: self.create_pullrequest.or(lower.create_pullrequest),
        }
    }

    /// Drop empty values so they never shadow a lower layer.
    #[must_use]
    pub fn normalized(self) -> Self {
        let n = |v: Option<String>| v.and_then(normalize);
        Self {
            tag_name: n(self.tag_name),
            zed_extensions: n(self.zed_extensions),
            push_to: n(self.push_to),
            extension_name: n(self.extension_name),
            base_branch: n(self.base_branch),
            extension_path: n(self.extension_path),
            commit_message: n(self.commit_message),
            create_pullrequest: n(self.create_pullrequest),
        }
    }
}

/// The environment variable GitHub Actions uses for an input.
///
/// `tag-name` becomes `INPUT_TAG-NAME`: upper-cased, spaces to underscores,
/// hyphens kept.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Trim a raw value; whitespace-only values are absent.
///
/// Only surrounding whitespace is dropped, so a multi-line commit message
/// keeps its inner line breaks.
fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
