//! Repository identity: the `owner/repo` pair.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

/// Error returned when a string is not a well-formed `owner/repo` spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `owner/repo`, got '{0}'")]
pub struct ParseRepoIdError(pub String);

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Compares owner and name ignoring ASCII case, the way GitHub does.
    pub fn eq_ignore_case(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.repo.eq_ignore_ascii_case(&other.repo)
    }
}

impl FromStr for RepoId {
    type Err = ParseRepoIdError;

    /// Parses `owner/repo`.
    ///
    /// Exactly one `/` is allowed and neither half may be empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRepoIdError(s.to_string());

        let (owner, repo) = s.trim().split_once('/').ok_or_else(err)?;
        let (owner, repo) = (owner.trim(), repo.trim());
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(err());
        }

        Ok(Self::new(owner, repo))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
