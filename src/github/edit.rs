//! Blob editing: commit a release into the registry.
//!
//! One commit moves the extension submodule to the released commit and
//! bumps the extension's manifest entry. The commit lands directly on the
//! base branch or on a fresh branch with a pull request, in the registry
//! itself, the configured push target, or a fork.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use jiff::Timestamp;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::manifest::{MANIFEST_PATH, ManifestError};
use crate::model::{RepoId, ResolvedEdit};

use super::{Api, ApiError, Clients};

/// Git mode of a submodule entry in a tree.
const GITLINK_MODE: &str = "160000";

/// Git mode of a regular file in a tree.
const BLOB_MODE: &str = "100644";

/// Errors that can occur while editing the registry.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("commit {sha} not found in {repo}")]
    UnknownCommit { sha: String, repo: RepoId },

    #[error("{path} is not a submodule in {repo}")]
    NotASubmodule { path: String, repo: RepoId },

    #[error("could not decode {path}: {message}")]
    Content { path: String, message: String },

    #[error("{repo} already has {path} at {sha} and an up-to-date manifest")]
    NothingToUpdate {
        repo: RepoId,
        path: String,
        sha: String,
    },
}

type Result<T> = core::result::Result<T, EditError>;

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
    #[serde(default)]
    permissions: Option<Permissions>,
}

#[derive(Deserialize)]
struct Permissions {
    #[serde(default)]
    push: bool,
}

#[derive(Deserialize)]
struct GitRef {
    object: ShaOnly,
}

#[derive(Deserialize)]
struct ShaOnly {
    sha: String,
}

#[derive(Deserialize)]
struct GitCommit {
    sha: String,
    tree: ShaOnly,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct Contents {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Fork {
    name: String,
    owner: Owner,
}

#[derive(Deserialize)]
struct Owner {
    login: String,
}

#[derive(Deserialize)]
struct PullRequest {
    html_url: String,
}

/// Apply a resolved edit to the registry.
///
/// Returns the URL of the pull request, or of the commit when pushing
/// directly.
pub fn edit_github_blob<C: Api>(clients: &Clients<C>, edit: &ResolvedEdit) -> Result<String> {
    let api = &clients.cross_repo;
    let target = &edit.target;

    let info: RepoInfo = fetch(api, &format!("repos/{target}"))?;
    verify_commit(&clients.same_repo, &edit.source, &edit.commit_sha)?;

    let head = match &edit.push_to {
        Some(push_to) => push_to.clone(),
        None if info.permissions.as_ref().is_some_and(|p| p.push) => target.clone(),
        None => {
            log::info!("no push access to {target}; forking");
            fork(api, target)?
        }
    };

    let base_branch = if edit.branch.is_empty() {
        info.default_branch.as_str()
    } else {
        edit.branch.as_str()
    };
    let parent: GitRef = fetch(api, &format!("repos/{target}/git/ref/heads/{base_branch}"))?;
    let parent_sha = parent.object.sha;
    let parent_commit: GitCommit = fetch(api, &format!("repos/{target}/git/commits/{parent_sha}"))?;

    let manifest: Contents = fetch(
        api,
        &format!("repos/{target}/contents/{MANIFEST_PATH}?ref={parent_sha}"),
    )?;
    let old_manifest = decode_content(MANIFEST_PATH, manifest.content.as_deref())?;
    let new_manifest = edit.replace.apply(&old_manifest)?;

    let submodule: Contents = fetch(
        api,
        &format!("repos/{target}/contents/{}?ref={parent_sha}", edit.extension_path),
    )?;
    if submodule.kind != "submodule" {
        return Err(EditError::NotASubmodule {
            path: edit.extension_path.clone(),
            repo: target.clone(),
        });
    }

    if new_manifest == old_manifest && submodule.sha == edit.commit_sha {
        return Err(EditError::NothingToUpdate {
            repo: target.clone(),
            path: edit.extension_path.clone(),
            sha: edit.commit_sha.clone(),
        });
    }

    log::info!(
        "updating {} to {} ({}) on {target}@{base_branch}",
        edit.extension_path,
        edit.replace.version,
        edit.commit_sha,
    );

    let tree: ShaOnly = send(
        api.post(
            &format!("repos/{head}/git/trees"),
            &json!({
                "base_tree": parent_commit.tree.sha,
                "tree": [
                    {
                        "path": MANIFEST_PATH,
                        "mode": BLOB_MODE,
                        "type": "blob",
                        "content": new_manifest,
                    },
                    {
                        "path": edit.extension_path,
                        "mode": GITLINK_MODE,
                        "type": "commit",
                        "sha": edit.commit_sha,
                    },
                ],
            }),
        ),
        "git/trees",
    )?;

    let commit: GitCommit = send(
        api.post(
            &format!("repos/{head}/git/commits"),
            &json!({
                "message": edit.commit_message,
                "tree": tree.sha,
                "parents": [parent_sha],
            }),
        ),
        "git/commits",
    )?;

    if should_open_pr(edit.make_pr, &head, target) {
        let branch = pr_branch_name(&edit.extension_path, Timestamp::now());
        api.post(
            &format!("repos/{head}/git/refs"),
            &json!({ "ref": format!("refs/heads/{branch}"), "sha": commit.sha }),
        )?;

        let (title, body) = split_message(&edit.commit_message);
        let pr: PullRequest = send(
            api.post(
                &format!("repos/{target}/pulls"),
                &json!({
                    "title": title,
                    "body": body,
                    "head": head_label(&head, target, &branch),
                    "base": base_branch,
                }),
            ),
            "pulls",
        )?;
        log::info!("opened {}", pr.html_url);
        return Ok(pr.html_url);
    }

    api.patch(
        &format!("repos/{head}/git/refs/heads/{base_branch}"),
        &json!({ "sha": commit.sha, "force": false }),
    )?;
    log::info!("pushed {} to {head}@{base_branch}", commit.sha);

    Ok(commit
        .html_url
        .unwrap_or_else(|| format!("https://github.com/{head}/commit/{}", commit.sha)))
}

/// Fail unless `sha` exists in `repo`.
fn verify_commit(api: &impl Api, repo: &RepoId, sha: &str) -> Result<()> {
    match api.get(&format!("repos/{repo}/commits/{sha}")) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.status(), Some(404 | 422)) => Err(EditError::UnknownCommit {
            sha: sha.to_string(),
            repo: repo.clone(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Fork `target` under the authenticated user.
fn fork(api: &impl Api, target: &RepoId) -> Result<RepoId> {
    let fork: Fork = send(
        api.post(&format!("repos/{target}/forks"), &json!({})),
        "forks",
    )?;
    Ok(RepoId::new(fork.owner.login, fork.name))
}

/// Whether to go through a pull request.
///
/// Unset means: only when pushing somewhere other than the target.
fn should_open_pr(make_pr: Option<bool>, head: &RepoId, target: &RepoId) -> bool {
    make_pr.unwrap_or_else(|| !head.eq_ignore_case(target))
}

/// Name of the branch a pull request is opened from: `update-<name>-<unix seconds>`.
fn pr_branch_name(extension_path: &str, now: Timestamp) -> String {
    let name = extension_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(extension_path);
    format!("update-{name}-{}", now.as_second())
}

/// The `head` of a pull request: the bare branch in the same repository,
/// `owner:branch` across repositories.
fn head_label(head: &RepoId, target: &RepoId, branch: &str) -> String {
    if head.eq_ignore_case(target) {
        branch.to_string()
    } else {
        format!("{}:{branch}", head.owner)
    }
}

/// Split a commit message into a PR title (first line) and body (the rest).
fn split_message(message: &str) -> (&str, &str) {
    match message.split_once('\n') {
        Some((title, body)) => (title.trim_end(), body.trim()),
        None => (message, ""),
    }
}

/// Decode a base64 contents payload; GitHub wraps it at 60 columns.
fn decode_content(path: &str, content: Option<&str>) -> Result<String> {
    let err = |message: String| EditError::Content {
        path: path.to_string(),
        message,
    };

    let encoded: String = content
        .ok_or_else(|| err("no content in response".to_string()))?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(encoded).map_err(|e| err(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| err(e.to_string()))
}

fn fetch<T: DeserializeOwned>(api: &impl Api, endpoint: &str) -> Result<T> {
    send(api.get(endpoint), endpoint)
}

fn send<T: DeserializeOwned>(
    response: core::result::Result<Value, ApiError>,
    endpoint: &str,
) -> Result<T> {
    serde_json::from_value(response?).map_err(|e| {
        EditError::Api(ApiError::Response {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    })
}
