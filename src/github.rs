//! GitHub API access.
//!
//! Requests go through the `gh` CLI's `api` subcommand, authenticated by
//! token via `GH_TOKEN`. Two clients are built per run from two tokens so
//! that access to the triggering repository and access to the registry are
//! checked independently.

mod edit;

use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;

pub use edit::edit_github_blob;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }
}

/// Errors that can occur while talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to run gh: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{method} {endpoint} returned HTTP {status}: {message}")]
    Status {
        method: &'static str,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{method} {endpoint} failed: {message}")]
    Failed {
        method: &'static str,
        endpoint: String,
        message: String,
    },

    #[error("unexpected response from {endpoint}: {message}")]
    Response { endpoint: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// The HTTP status, when the API answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A JSON-in, JSON-out GitHub REST client.
pub trait Api {
    /// Send a request to `endpoint` (relative, e.g. `repos/o/r`) and return the
    /// decoded response body. An empty body comes back as `Value::Null`.
    fn request(&self, method: Method, endpoint: &str, body: Option<&Value>)
    -> Result<Value, ApiError>;

    fn get(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.request(Method::Get, endpoint, None)
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::Post, endpoint, Some(body))
    }

    fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::Patch, endpoint, Some(body))
    }
}

/// API client scoped to one token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    token: String,
}

impl GitHubClient {
    /// Build a client for `token`.
    ///
    /// An empty token leaves `gh` to its own stored authentication.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Api for GitHubClient {
    fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        log::debug!("{} {endpoint}", method.as_str());

        let mut command = Command::new("gh");
        command
            .args(["api", endpoint, "--method", method.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !self.token.is_empty() {
            command.env("GH_TOKEN", &self.token);
        }
        if body.is_some() {
            command.args(["--input", "-"]).stdin(Stdio::piped());
        }

        let mut child = command.spawn()?;
        if let (Some(body), Some(mut stdin)) = (body, child.stdin.take()) {
            stdin.write_all(&serde_json::to_vec(body)?)?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(match parse_http_status(&stderr) {
                Some(status) => ApiError::Status {
                    method: method.as_str(),
                    endpoint: endpoint.to_string(),
                    status,
                    message: stderr,
                },
                None => ApiError::Failed {
                    method: method.as_str(),
                    endpoint: endpoint.to_string(),
                    message: stderr,
                },
            });
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// The two clients of a run.
#[derive(Debug, Clone)]
pub struct Clients<C = GitHubClient> {
    /// Reads the triggering repository.
    pub same_repo: C,

    /// Reads and writes the registry and the push target.
    pub cross_repo: C,
}

impl Clients {
    /// Build both clients from `GITHUB_TOKEN` and `COMMITTER_TOKEN`.
    pub fn from_env() -> Self {
        Self::from_tokens(
            |token| GitHubClient::new(token),
            env::var("GITHUB_TOKEN").ok(),
            env::var("COMMITTER_TOKEN").ok(),
        )
    }
}

impl<C> Clients<C> {
    /// Build both clients through `factory`.
    ///
    /// The same-repo token is `github_token`, else `committer_token`.
    /// The cross-repo token is `committer_token`, else the same-repo token.
    pub fn from_tokens(
        factory: impl Fn(&str) -> C,
        github_token: Option<String>,
        committer_token: Option<String>,
    ) -> Self {
        let non_empty = |t: Option<String>| t.filter(|t| !t.is_empty());
        let committer = non_empty(committer_token);
        let internal = non_empty(github_token)
            .or_else(|| committer.clone())
            .unwrap_or_default();
        let external = committer.unwrap_or_else(|| internal.clone());

        if external.is_empty() {
            log::warn!("neither GITHUB_TOKEN nor COMMITTER_TOKEN is set; using gh's own login");
        }

        Self {
            same_repo: factory(&internal),
            cross_repo: factory(&external),
        }
    }
}

/// Pull the status out of `gh`'s error output, e.g. `gh: Not Found (HTTP 404)`.
fn parse_http_status(stderr: &str) -> Option<u16> {
    let start = stderr.rfind("(HTTP ")? + "(HTTP ".len();
    let digits: String = stderr[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_status_from_gh_output() {
        assert_eq!(parse_http_status("gh: Not Found (HTTP 404)"), Some(404));
        assert_eq!(
            parse_http_status("gh: Validation Failed (HTTP 422)\nmore detail"),
            Some(422)
        );
        assert_eq!(parse_http_status("error connecting to api.github.com"), None);
    }

    #[test]
    fn status_accessor() {
        let err = ApiError::Status {
            method: "GET",
            endpoint: "repos/a/b".into(),
            status: 403,
            message: "forbidden".into(),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(
            ApiError::Response {
                endpoint: "x".into(),
                message: "y".into()
            }
            .status(),
            None
        );
    }

    fn tokens(github: Option<&str>, committer: Option<&str>) -> (String, String) {
        let clients = Clients::from_tokens(
            str::to_string,
            github.map(String::from),
            committer.map(String::from),
        );
        (clients.same_repo, clients.cross_repo)
    }

    #[test]
    fn both_tokens_stay_separate() {
        assert_eq!(
            tokens(Some("run"), Some("bot")),
            ("run".to_string(), "bot".to_string())
        );
    }

    #[test]
    fn committer_falls_back_to_run_token() {
        assert_eq!(
            tokens(Some("run"), None),
            ("run".to_string(), "run".to_string())
        );
        assert_eq!(
            tokens(Some("run"), Some("")),
            ("run".to_string(), "run".to_string())
        );
    }

    #[test]
    fn run_token_falls_back_to_committer() {
        assert_eq!(
            tokens(None, Some("bot")),
            ("bot".to_string(), "bot".to_string())
        );
    }

    #[test]
    fn no_tokens_yield_empty() {
        assert_eq!(tokens(None, None), (String::new(), String::new()));
    }
}
