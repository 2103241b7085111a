//! Configuration for a single invocation.
//!
//! [`ActionInputs`] holds the raw inputs. The optional repository config file
//! (`release-please-config.json` by default) may supply a few of the same
//! options; explicit inputs always win over the file, and the file wins over
//! built-in defaults.
use derive_builder::Builder;
use secrecy::SecretString;
use semver::Version;
use serde::Deserialize;

use crate::{
    ReleaseError, Result,
    forge::config::{DEFAULT_COMMIT_SEARCH_DEPTH, RemoteConfig, parse_api_url},
    release::ROOT_PATH,
    version::{VersioningStrategy, parse_release_as},
};

/// Default branch releases are cut from.
pub const DEFAULT_TARGET_BRANCH: &str = "main";
/// Default repository config file name.
pub const DEFAULT_CONFIG_FILE: &str = "release-please-config.json";
/// Default manifest file name.
pub const DEFAULT_MANIFEST_FILE: &str = ".release-please-manifest.json";

#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(private, name = "_build"))]
pub struct ActionInputsParams {
    pub token: SecretString,
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    #[builder(default)]
    pub release_type: Option<String>,
    #[builder(default = "ROOT_PATH.to_string()")]
    pub path: String,
    #[builder(default = "DEFAULT_TARGET_BRANCH.to_string()")]
    pub target_branch: String,
    #[builder(default = "DEFAULT_CONFIG_FILE.to_string()")]
    pub config_file: String,
    #[builder(default = "DEFAULT_MANIFEST_FILE.to_string()")]
    pub manifest_file: String,
    #[builder(default)]
    pub proxy_server: Option<String>,
    #[builder(default)]
    pub skip_gitea_release: bool,
    #[builder(default)]
    pub skip_gitea_pull_request: bool,
    #[builder(default)]
    pub skip_labeling: bool,
    #[builder(default)]
    pub include_component_in_tag: Option<bool>,
    #[builder(default)]
    pub changelog_host: Option<String>,
    #[builder(default)]
    pub versioning_strategy: Option<VersioningStrategy>,
    #[builder(default)]
    pub release_as: Option<String>,
    /// 0 means no limit.
    #[builder(default = "DEFAULT_COMMIT_SEARCH_DEPTH")]
    pub commit_search_depth: u64,
}

impl ActionInputsParamsBuilder {
    pub fn build(&self) -> Result<ActionInputs> {
        let params = self._build().map_err(|e| {
            ReleaseError::invalid_config(format!(
                "Failed to build action inputs: {}",
                e
            ))
        })?;
        ActionInputs::new(params)
    }
}

/// Validated inputs for one invocation. Read-only once built.
#[derive(Debug, Clone)]
pub struct ActionInputs {
    pub remote: RemoteConfig,
    pub release_type: Option<String>,
    pub path: String,
    pub target_branch: String,
    pub config_file: String,
    pub manifest_file: String,
    pub skip_gitea_release: bool,
    pub skip_gitea_pull_request: bool,
    pub skip_labeling: bool,
    pub include_component_in_tag: Option<bool>,
    pub changelog_host: Option<String>,
    pub versioning_strategy: Option<VersioningStrategy>,
    pub release_as: Option<Version>,
    pub commit_search_depth: u64,
}

impl ActionInputs {
    pub fn builder() -> ActionInputsParamsBuilder {
        ActionInputsParamsBuilder::default()
    }

    pub fn new(params: ActionInputsParams) -> Result<Self> {
        for (name, value) in [
            ("owner", &params.owner),
            ("repo", &params.repo),
            ("target-branch", &params.target_branch),
        ] {
            if value.trim().is_empty() {
                return Err(ReleaseError::invalid_config(format!(
                    "{name} must not be empty"
                )));
            }
        }

        let release_as = params
            .release_as
            .as_deref()
            .map(parse_release_as)
            .transpose()?;

        let path = params
            .path
            .trim()
            .trim_start_matches("./")
            .trim_end_matches('/')
            .to_string();

        let path = if path.is_empty() {
            ROOT_PATH.to_string()
        } else {
            path
        };

        let commit_search_depth = if params.commit_search_depth == 0 {
            u64::MAX
        } else {
            params.commit_search_depth
        };

        Ok(Self {
            remote: RemoteConfig {
                api_url: parse_api_url(&params.api_url)?,
                owner: params.owner,
                repo: params.repo,
                token: params.token,
                proxy: params.proxy_server,
            },
            release_type: params.release_type,
            path,
            target_branch: params.target_branch,
            config_file: params.config_file,
            manifest_file: params.manifest_file,
            skip_gitea_release: params.skip_gitea_release,
            skip_gitea_pull_request: params.skip_gitea_pull_request,
            skip_labeling: params.skip_labeling,
            include_component_in_tag: params.include_component_in_tag,
            changelog_host: params.changelog_host,
            versioning_strategy: params.versioning_strategy,
            release_as,
            commit_search_depth,
        })
    }

    /// Base URL for commit links in the changelog, if a host is configured.
    pub fn commit_link_base_url(&self) -> Option<String> {
        self.changelog_host.as_ref().map(|host| {
            format!(
                "{}/{}/commit",
                host.trim_end_matches('/'),
                self.remote.full_name()
            )
        })
    }
}

/// Options read from the repository config file. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepoConfig {
    pub versioning: Option<String>,
    pub include_component_in_tag: Option<bool>,
    pub release_as: Option<String>,
}

impl RepoConfig {
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ReleaseError::invalid_config(format!(
                "failed to parse repository config: {e}"
            ))
        })
    }
}

/// Effective settings after layering inputs over the repository config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSettings {
    pub versioning_strategy: VersioningStrategy,
    pub include_component_in_tag: bool,
    pub release_as: Option<Version>,
}

impl ReleaseSettings {
    pub fn resolve(inputs: &ActionInputs, file: &RepoConfig) -> Result<Self> {
        let versioning_strategy = inputs
            .versioning_strategy
            .or_else(|| {
                file.versioning
                    .as_deref()
                    .map(VersioningStrategy::from)
            })
            .unwrap_or_default();

        let include_component_in_tag = inputs
            .include_component_in_tag
            .or(file.include_component_in_tag)
            .unwrap_or(false);

        let release_as = match &inputs.release_as {
            Some(version) => Some(version.clone()),
            None => file
                .release_as
                .as_deref()
                .map(parse_release_as)
                .transpose()?,
        };

        Ok(Self {
            versioning_strategy,
            include_component_in_tag,
            release_as,
        })
    }
}
