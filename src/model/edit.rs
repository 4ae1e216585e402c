//! The resolved edit: everything the collaborator needs to update the registry.

use serde::Serialize;

use crate::manifest::ManifestBump;

use super::RepoId;

/// A fully resolved registry edit.
///
/// Built once per run by the resolver and handed to the blob-edit
/// collaborator unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdit {
    /// Registry repository to update.
    pub target: RepoId,

    /// Repository that triggered the run.
    pub source: RepoId,

    /// Base branch in the target; empty means the repository's default branch.
    pub branch: String,

    /// Path of the extension submodule inside the target.
    pub extension_path: String,

    /// Commit message with all known placeholders substituted.
    pub commit_message: String,

    /// Repository to push to instead of the target, when set.
    pub push_to: Option<RepoId>,

    /// Whether to open a pull request. `None` leaves it to the collaborator.
    pub make_pr: Option<bool>,

    /// Commit the extension submodule should point at.
    pub commit_sha: String,

    /// Transform applied to the registry manifest.
    pub replace: ManifestBump,
}
