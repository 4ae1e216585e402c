//! CLI interface.
//!
//! Runs as a GitHub Action step (inputs arrive as `INPUT_*` variables) or by
//! hand, with the same inputs given as flags. Flags win over action inputs,
//! which win over the config file.
//!
//! On success the URL of the created commit or pull request is the only
//! thing written to stdout.

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser};

use crate::config::Inputs;
use crate::github::{self, Clients};
use crate::model::RunContext;
use crate::resolve;

/// Publish a tagged extension release to the Zed extensions registry.
#[derive(Debug, Parser)]
#[command(name = "zed-extension-action", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Read inputs from this TOML file (keys as the input names, e.g. `commit-message`).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Triggering ref. Overrides `GITHUB_REF`.
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Triggering commit. Overrides `GITHUB_SHA`.
    #[arg(long)]
    pub sha: Option<String>,

    /// Triggering repository as `owner/repo`. Overrides `GITHUB_REPOSITORY`.
    #[arg(long)]
    pub repository: Option<String>,

    /// Print the resolved edit as JSON instead of applying it.
    #[arg(long)]
    pub dry_run: bool,
}

const USAGE_HELP: &str = r#"As a workflow step, on tag push:
  - uses: <this action>
    with:
      zed-extensions: zed-industries/extensions
      commit-message: "{{extensionName}} {{version}}"
    env:
      COMMITTER_TOKEN: ${{ secrets.COMMITTER_TOKEN }}

By hand:
  zed-extension-action --repository acme/my-ext --sha <commit> --ref refs/tags/v1.2.0 \
    --zed-extensions zed-industries/extensions \
    --commit-message "Update {{extensionName}} to {{version}}" --dry-run

Placeholders in the commit message: {{owner}}, {{repo}}, {{extensionName}}, {{version}}."#;

/// The action inputs as flags.
#[derive(Debug, Default, Args)]
pub struct InputArgs {
    /// Release tag. Defaults to the tag in the triggering ref.
    #[arg(long)]
    pub tag_name: Option<String>,

    /// Registry repository as `owner/repo`.
    #[arg(long)]
    pub zed_extensions: Option<String>,

    /// Repository to push the commit to as `owner/repo`.
    #[arg(long)]
    pub push_to: Option<String>,

    /// Extension name. Defaults to the triggering repository's name, lower-cased.
    #[arg(long)]
    pub extension_name: Option<String>,

    /// Registry branch to update. Defaults to the registry's default branch.
    #[arg(long)]
    pub base_branch: Option<String>,

    /// Submodule path in the registry. Defaults to `extensions/<extension name>`.
    #[arg(long)]
    pub extension_path: Option<String>,

    /// Commit message template.
    #[arg(long)]
    pub commit_message: Option<String>,

    /// Open a pull request (`true`) or push directly (`false`).
    #[arg(long)]
    pub create_pullrequest: Option<String>,
}

impl InputArgs {
    fn into_inputs(self) -> Inputs {
        Inputs {
            tag_name: self.tag_name,
            zed_extensions: self.zed_extensions,
            push_to: self.push_to,
            extension_name: self.extension_name,
            base_branch: self.base_branch,
            extension_path: self.extension_path,
            commit_message: self.commit_message,
            create_pullrequest: self.create_pullrequest,
        }
        .normalized()
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    execute(Cli::parse())
}

fn execute(cli: Cli) -> Result<(), String> {
    let ctx = run_context(&cli, |name| env::var(name).ok())?;
    let file = Inputs::from_config_file(cli.config.as_deref())?;
    let inputs = cli.inputs.into_inputs().or(Inputs::from_env()).or(file);

    let edit = resolve::prepare_edit(&ctx, &inputs).map_err(|e| e.to_string())?;

    if cli.dry_run {
        let json = serde_json::to_string_pretty(&edit)
            .map_err(|e| format!("failed to serialize edit: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let clients = Clients::from_env();
    let url = github::edit_github_blob(&clients, &edit)
        .map_err(|e| format!("failed to update {}: {e}", edit.target))?;

    println!("{url}");
    Ok(())
}

/// Build the run context, letting flags override the environment.
fn run_context(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<RunContext, String> {
    RunContext::from_lookup(|name| {
        let flag = match name {
            "GITHUB_REF" => cli.git_ref.clone(),
            "GITHUB_SHA" => cli.sha.clone(),
            "GITHUB_REPOSITORY" => cli.repository.clone(),
            _ => None,
        };
        flag.or_else(|| env(name))
    })
}
