//! Edit resolution: turn a run context and its inputs into a registry edit.
//!
//! Pure computation. Nothing here touches the network; the result is handed
//! to the blob-edit collaborator in [`crate::github`].

use std::collections::HashMap;

use crate::config::Inputs;
use crate::manifest::ManifestBump;
use crate::model::{RepoId, ResolvedEdit, RunContext};
use crate::template;

/// Prefix a ref must carry to name a tag.
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Directory in the registry that holds extension submodules.
const EXTENSIONS_ROOT: &str = "extensions";

/// Errors that can occur while resolving an edit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid ref: {0} (expected refs/tags/<tag>, or set tag-name)")]
    InvalidReference(String),

    #[error("input required and not supplied: {0}")]
    MissingConfiguration(&'static str),

    #[error("input {input} must be `owner/repo`, got '{value}'")]
    MalformedRepoSpec { input: &'static str, value: String },

    #[error("input {input} must be one of true|True|TRUE|false|False|FALSE, got '{value}'")]
    InvalidBoolean { input: &'static str, value: String },
}

/// Resolve the edit for a release.
pub fn prepare_edit(ctx: &RunContext, inputs: &Inputs) -> Result<ResolvedEdit, ResolveError> {
    let tag_name = match inputs.tag_name.as_deref() {
        Some(tag) => tag.to_string(),
        None => tag_from_ref(&ctx.git_ref)?.to_string(),
    };

    let target = repo_input("zed-extensions", inputs.zed_extensions.as_deref())?
        .ok_or(ResolveError::MissingConfiguration("zed-extensions"))?;

    let push_to = match repo_input("push-to", inputs.push_to.as_deref())? {
        Some(explicit) => Some(explicit),
        // A run-scoped token pushing into its own repository can look like
        // it lacks push access; routing through the same repository skips
        // any attempt to fork it.
        None if target.eq_ignore_case(&ctx.repo) => Some(ctx.repo.clone()),
        None => None,
    };

    let extension_name = inputs
        .extension_name
        .clone()
        .unwrap_or_else(|| ctx.repo.repo.to_lowercase());
    let branch = inputs.base_branch.clone().unwrap_or_default();
    let extension_path = inputs
        .extension_path
        .clone()
        .unwrap_or_else(|| default_extension_path(&extension_name));
    let version = version_from_tag(&tag_name).to_string();

    let message_template = inputs
        .commit_message
        .as_deref()
        .ok_or(ResolveError::MissingConfiguration("commit-message"))?;

    let make_pr = inputs
        .create_pullrequest
        .as_deref()
        .map(|value| parse_boolean_input("create-pullrequest", value))
        .transpose()?;

    let params = HashMap::from([
        ("owner", ctx.repo.owner.as_str()),
        ("repo", ctx.repo.repo.as_str()),
        ("extensionName", extension_name.as_str()),
        ("version", version.as_str()),
    ]);
    let commit_message = template::commit_message(message_template, &params);

    log::debug!("resolved tag {tag_name} to version {version} for {extension_name}");

    Ok(ResolvedEdit {
        target,
        source: ctx.repo.clone(),
        branch,
        extension_path,
        commit_message,
        push_to,
        make_pr,
        commit_sha: ctx.sha.clone(),
        replace: ManifestBump::new(extension_name, version),
    })
}

/// Strip `refs/tags/` from a ref.
pub fn tag_from_ref(git_ref: &str) -> Result<&str, ResolveError> {
    git_ref
        .strip_prefix(TAG_REF_PREFIX)
        .ok_or_else(|| ResolveError::InvalidReference(git_ref.to_string()))
}

/// Derive a version from a tag: a leading `v` is dropped only when a digit follows it.
///
/// `v1.2.3` → `1.2.3`, `v9b` → `9b`, `version-9` and `1.2.3` unchanged.
pub fn version_from_tag(tag: &str) -> &str {
    match tag.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => tag,
    }
}

/// Default submodule path for an extension: `extensions/<name>`.
pub fn default_extension_path(extension_name: &str) -> String {
    format!("{EXTENSIONS_ROOT}/{extension_name}")
}

/// Parse a boolean input the way GitHub Actions does (YAML 1.2 core schema).
pub fn parse_boolean_input(input: &'static str, value: &str) -> Result<bool, ResolveError> {
    match value {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        _ => Err(ResolveError::InvalidBoolean {
            input,
            value: value.to_string(),
        }),
    }
}

fn repo_input(input: &'static str, value: Option<&str>) -> Result<Option<RepoId>, ResolveError> {
    value
        .map(|v| {
            v.parse::<RepoId>().map_err(|_| ResolveError::MalformedRepoSpec {
                input,
                value: v.to_string(),
            })
        })
        .transpose()
}
