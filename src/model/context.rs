//! Run context: what the hosting automation tells us about the triggering run.

use super::RepoId;

/// The triggering run, as reported by the GitHub Actions environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Reference that triggered the run, e.g. `refs/tags/v1.2.3`.
    pub git_ref: String,

    /// Commit that triggered the run.
    pub sha: String,

    /// Repository that triggered the run.
    pub repo: RepoId,
}

impl RunContext {
    /// Read the context through an arbitrary variable lookup.
    ///
    /// `GITHUB_REF` may be absent (an explicit tag name can stand in for it);
    /// `GITHUB_SHA` and `GITHUB_REPOSITORY` are required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let git_ref = var("GITHUB_REF").unwrap_or_default();
        let sha = var("GITHUB_SHA").ok_or("GITHUB_SHA is not set")?;
        let repository = var("GITHUB_REPOSITORY").ok_or("GITHUB_REPOSITORY is not set")?;
        let repo = repository
            .parse()
            .map_err(|e| format!("invalid GITHUB_REPOSITORY: {e}"))?;

        Ok(Self { git_ref, sha, repo })
    }
}
