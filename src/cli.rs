//! CLI argument parsing and GitHub connection configuration.
//!
//! Every argument can also be supplied through the environment a workflow
//! step receives (`INPUT_*` for action inputs, `GITHUB_*` for the runner
//! context), so the binary runs unchanged as a CLI or as an action.
use clap::{Parser, ValueEnum};
use secrecy::SecretString;
use std::env;

use crate::{
    ReleaseError, Result,
    config::{Config, MakeLatest, parse_input_files},
    forge::config::{DEFAULT_API_URL, RemoteConfig},
};

/// Runner variable that turns on step debug logging.
pub const RUNNER_DEBUG_VAR: &str = "RUNNER_DEBUG";

/// Create or update a GitHub release and upload files as its assets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "INPUT_TOKEN", default_value = "", hide_env_values = true)]
    /// GitHub token. Falls back to GITHUB_TOKEN env var.
    pub token: String,

    #[arg(long, env = "INPUT_REPOSITORY", default_value = "")]
    /// Repository as owner/repo. Falls back to GITHUB_REPOSITORY env var.
    pub repository: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    /// REST API root.
    pub api_url: String,

    #[arg(long, env = "GITHUB_REF", default_value = "")]
    /// Ref that triggered the run, e.g. refs/tags/v1.0.0.
    pub github_ref: String,

    #[arg(long, env = "INPUT_TAG_NAME", default_value = "")]
    /// Tag to release. Defaults to the tag named by --github-ref.
    pub tag_name: String,

    #[arg(long, env = "INPUT_NAME", default_value = "")]
    /// Release name. Defaults to the tag.
    pub name: String,

    #[arg(long, env = "INPUT_BODY", default_value = "")]
    /// Release notes.
    pub body: String,

    #[arg(long, env = "INPUT_BODY_PATH", default_value = "")]
    /// File whose contents are used as release notes instead of --body.
    pub body_path: String,

    #[arg(long, env = "INPUT_APPEND_BODY", default_value = "")]
    /// Append notes to the existing release body (true/false).
    pub append_body: String,

    #[arg(long, env = "INPUT_DRAFT", default_value = "")]
    /// Keep the release as a draft (true/false).
    pub draft: String,

    #[arg(long, env = "INPUT_PRERELEASE", default_value = "")]
    /// Mark the release as a prerelease (true/false).
    pub prerelease: String,

    #[arg(long, env = "INPUT_TARGET_COMMITISH", default_value = "")]
    /// Commitish the tag is created from when it does not exist yet.
    pub target_commitish: String,

    #[arg(long, env = "INPUT_FILES", default_value = "")]
    /// Newline or comma separated globs. Use glob#name to rename a match.
    pub files: String,

    #[arg(long, env = "INPUT_WORKING_DIRECTORY", default_value = "")]
    /// Directory file globs are resolved against.
    pub working_directory: String,

    #[arg(long, env = "INPUT_FAIL_ON_UNMATCHED_FILES", default_value = "")]
    /// Fail when a glob matches nothing (true/false).
    pub fail_on_unmatched_files: String,

    #[arg(long, env = "INPUT_DISCUSSION_CATEGORY_NAME", default_value = "")]
    /// Discussion category to open for the release.
    pub discussion_category_name: String,

    #[arg(long, env = "INPUT_GENERATE_RELEASE_NOTES", default_value = "")]
    /// Let GitHub generate release notes on create (true/false).
    pub generate_release_notes: String,

    #[arg(long, env = "INPUT_MAKE_LATEST", default_value = "")]
    /// Mark as latest: true, false or legacy.
    pub make_latest: String,

    #[arg(long, env = "INPUT_OVERWRITE_FILES", default_value = "")]
    /// Replace assets that already exist (true/false, default true).
    pub overwrite_files: String,

    #[arg(long, env = "INPUT_PRESERVE_ORDER", default_value = "")]
    /// Upload files one at a time in the order given (true/false).
    pub preserve_order: String,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging. Also enabled by RUNNER_DEBUG=1.
    pub debug: bool,
}

impl Args {
    pub fn debug_enabled(&self) -> bool {
        self.debug || env::var(RUNNER_DEBUG_VAR).is_ok_and(|v| v == "1")
    }

    /// Build the run configuration. Empty values count as unset.
    pub fn to_config(&self) -> Result<Config> {
        let mut builder = Config::builder();

        if let Some(github_ref) = non_empty(&self.github_ref) {
            builder.github_ref(github_ref);
        }
        if let Some(tag) = non_empty(&self.tag_name) {
            builder.tag_name(tag);
        }
        if let Some(name) = non_empty(&self.name) {
            builder.name(name);
        }
        if let Some(body) = non_empty(&self.body) {
            builder.body(body);
        }
        if let Some(path) = non_empty(&self.body_path) {
            builder.body_path(path);
        }
        if let Some(draft) = parse_bool("draft", &self.draft)? {
            builder.draft(draft);
        }
        if let Some(prerelease) = parse_bool("prerelease", &self.prerelease)? {
            builder.prerelease(prerelease);
        }
        if let Some(target) = non_empty(&self.target_commitish) {
            builder.target_commitish(target);
        }
        if let Some(dir) = non_empty(&self.working_directory) {
            builder.working_directory(dir);
        }
        if let Some(category) = non_empty(&self.discussion_category_name) {
            builder.discussion_category_name(category);
        }
        if let Some(latest) = non_empty(&self.make_latest) {
            let latest = MakeLatest::from_str(&latest, true).map_err(|_| {
                ReleaseError::invalid_config(format!(
                    "make_latest must be one of true, false or legacy: {latest}"
                ))
            })?;
            builder.make_latest(latest);
        }

        builder
            .files(parse_input_files(&self.files))
            .append_body(
                parse_bool("append_body", &self.append_body)?.unwrap_or(false),
            )
            .fail_on_unmatched_files(
                parse_bool("fail_on_unmatched_files", &self.fail_on_unmatched_files)?
                    .unwrap_or(false),
            )
            .generate_release_notes(
                parse_bool("generate_release_notes", &self.generate_release_notes)?
                    .unwrap_or(false),
            )
            .overwrite_files(
                parse_bool("overwrite_files", &self.overwrite_files)?
                    .unwrap_or(true),
            )
            .preserve_order(
                parse_bool("preserve_order", &self.preserve_order)?
                    .unwrap_or(false),
            );

        builder
            .build()
            .map_err(|e| ReleaseError::invalid_config(e.to_string()))
    }

    /// Configure the GitHub connection from arguments and runner env vars.
    pub fn remote_config(&self) -> Result<RemoteConfig> {
        let mut token = self.token.trim().to_string();

        if token.is_empty()
            && let Ok(env_var_token) = env::var("GITHUB_TOKEN")
        {
            token = env_var_token;
        }

        if token.is_empty() {
            return Err(ReleaseError::invalid_config("must set github token"));
        }

        let mut repository = self.repository.trim().to_string();

        if repository.is_empty()
            && let Ok(env_var_repo) = env::var("GITHUB_REPOSITORY")
        {
            repository = env_var_repo;
        }

        let (owner, repo) = parse_repository(&repository)?;

        let api_url = non_empty(&self.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(RemoteConfig {
            api_url,
            owner,
            repo,
            token: SecretString::from(token),
        })
    }
}

/// Split `owner/repo` into its parts.
fn parse_repository(repository: &str) -> Result<(String, String)> {
    match repository.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ReleaseError::invalid_config(format!(
            "repository must be in the form owner/repo: '{repository}'"
        ))),
    }
}

/// Boolean action input. Empty means unset.
fn parse_bool(input: &str, value: &str) -> Result<Option<bool>> {
    match value.trim() {
        "" => Ok(None),
        "true" | "True" | "TRUE" => Ok(Some(true)),
        "false" | "False" | "FALSE" => Ok(Some(false)),
        other => Err(ReleaseError::invalid_config(format!(
            "input {input} must be true or false: '{other}'"
        ))),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
