//! CLI argument parsing with fallback to runner provided inputs.
//!
//! Every input can be passed as `--<name>`. When the flag is absent or empty
//! the runner's `INPUT_<NAME>` variable is used, followed by the well known
//! runner variables for connection details.
use clap::Parser;
use secrecy::SecretString;
use std::env;

use crate::{
    ReleaseError, Result, config::ActionInputs, version::VersioningStrategy,
};

/// Inputs for a single release run.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value = "")]
    /// Gitea access token. Falls back to GITEA_TOKEN, then GITHUB_TOKEN.
    pub token: String,

    #[arg(long, default_value = "")]
    /// Gitea API base URL, e.g. https://gitea.example.com/api/v1.
    pub gitea_api_url: String,

    #[arg(long, default_value = "")]
    /// Repository owner. Falls back to GITHUB_REPOSITORY.
    pub owner: String,

    #[arg(long, default_value = "")]
    /// Repository name. Falls back to GITHUB_REPOSITORY.
    pub repo: String,

    #[arg(long, default_value = "")]
    /// Release type. Logged only.
    pub release_type: String,

    #[arg(long, default_value = "")]
    /// Component path within the repository.
    pub path: String,

    #[arg(long, default_value = "")]
    /// Branch releases are cut from.
    pub target_branch: String,

    #[arg(long, default_value = "")]
    /// Repository config file read from the target branch.
    pub config_file: String,

    #[arg(long, default_value = "")]
    /// Manifest file updated on the release branch.
    pub manifest_file: String,

    #[arg(long, default_value = "")]
    /// HTTP proxy for all API requests.
    pub proxy_server: String,

    #[arg(long, default_value = "")]
    /// Skip release creation (true or false).
    pub skip_gitea_release: String,

    #[arg(long, default_value = "")]
    /// Skip release pull request creation (true or false).
    pub skip_gitea_pull_request: String,

    #[arg(long, default_value = "")]
    /// Do not label the release pull request (true or false).
    pub skip_labeling: String,

    #[arg(long, default_value = "")]
    /// Prefix tags with the component path (true or false).
    pub include_component_in_tag: String,

    #[arg(long, default_value = "")]
    /// Web host used for commit links in the changelog.
    pub changelog_host: String,

    #[arg(long, default_value = "")]
    /// always-bump-major, always-bump-minor or always-bump-patch.
    pub versioning_strategy: String,

    #[arg(long, default_value = "")]
    /// Release this exact version instead of computing one.
    pub release_as: String,

    #[arg(long, default_value = "")]
    /// Maximum commits to search for the changelog. Use 0 for full history.
    pub commit_search_depth: String,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,
}

impl Args {
    /// Debug logging requested by flag, `INPUT_DEBUG` or `RUNNER_DEBUG=1`.
    pub fn debug_enabled(&self) -> bool {
        self.debug
            || matches!(input_bool("", "debug"), Ok(Some(true)))
            || env_value("RUNNER_DEBUG").is_some_and(|v| v == "1")
    }

    /// Resolves every input and validates them into [`ActionInputs`].
    pub fn into_inputs(self) -> Result<ActionInputs> {
        let token = input(&self.token, "token")
            .or_else(|| env_value("GITEA_TOKEN"))
            .or_else(|| env_value("GITHUB_TOKEN"))
            .ok_or_else(|| {
                ReleaseError::invalid_args(
                    "must set token (--token, GITEA_TOKEN or GITHUB_TOKEN)",
                )
            })?;

        let api_url = input(&self.gitea_api_url, "gitea-api-url")
            .or_else(|| env_value("GITEA_API_URL"))
            .or_else(|| env_value("GITHUB_API_URL"))
            .ok_or_else(|| {
                ReleaseError::invalid_args(
                    "must set gitea-api-url (--gitea-api-url or GITEA_API_URL)",
                )
            })?;

        let (repository_owner, repository_name) = env_value("GITHUB_REPOSITORY")
            .and_then(|full| {
                full.split_once('/')
                    .map(|(owner, repo)| (owner.to_string(), repo.to_string()))
            })
            .unzip();

        let owner = input(&self.owner, "owner")
            .or(repository_owner)
            .ok_or_else(|| ReleaseError::invalid_args("must set owner"))?;

        let repo = input(&self.repo, "repo")
            .or(repository_name)
            .ok_or_else(|| ReleaseError::invalid_args("must set repo"))?;

        let mut builder = ActionInputs::builder();

        builder
            .token(SecretString::from(token))
            .api_url(api_url)
            .owner(owner)
            .repo(repo)
            .release_type(input(&self.release_type, "release-type"))
            .proxy_server(input(&self.proxy_server, "proxy-server"))
            .skip_gitea_release(
                input_bool(&self.skip_gitea_release, "skip-gitea-release")?
                    .unwrap_or(false),
            )
            .skip_gitea_pull_request(
                input_bool(
                    &self.skip_gitea_pull_request,
                    "skip-gitea-pull-request",
                )?
                .unwrap_or(false),
            )
            .skip_labeling(
                input_bool(&self.skip_labeling, "skip-labeling")?
                    .unwrap_or(false),
            )
            .include_component_in_tag(input_bool(
                &self.include_component_in_tag,
                "include-component-in-tag",
            )?)
            .changelog_host(input(&self.changelog_host, "changelog-host"))
            .versioning_strategy(
                input(&self.versioning_strategy, "versioning-strategy")
                    .as_deref()
                    .map(VersioningStrategy::from),
            )
            .release_as(input(&self.release_as, "release-as"));

        if let Some(path) = input(&self.path, "path") {
            builder.path(path);
        }

        if let Some(target_branch) = input(&self.target_branch, "target-branch")
        {
            builder.target_branch(target_branch);
        }

        if let Some(config_file) = input(&self.config_file, "config-file") {
            builder.config_file(config_file);
        }

        if let Some(manifest_file) = input(&self.manifest_file, "manifest-file")
        {
            builder.manifest_file(manifest_file);
        }

        if let Some(depth) =
            input(&self.commit_search_depth, "commit-search-depth")
        {
            let depth = depth.parse::<u64>().map_err(|e| {
                ReleaseError::invalid_args(format!(
                    "commit-search-depth must be a non-negative integer: {e}"
                ))
            })?;
            builder.commit_search_depth(depth);
        }

        builder.build()
    }
}

/// Strict boolean parsing for inputs.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(ReleaseError::invalid_args(format!(
            "input {name} must be true or false, got \"{other}\""
        ))),
    }
}

/// Flag value, else `INPUT_<NAME>` (runners keep dashes; underscores are
/// accepted as well). Empty values count as unset.
fn input(flag: &str, name: &str) -> Option<String> {
    let upper = name.to_uppercase();

    non_empty(flag)
        .or_else(|| env_value(&format!("INPUT_{upper}")))
        .or_else(|| env_value(&format!("INPUT_{}", upper.replace('-', "_"))))
}

fn input_bool(flag: &str, name: &str) -> Result<Option<bool>> {
    input(flag, name)
        .map(|value| parse_bool(name, &value))
        .transpose()
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|v| non_empty(&v))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
