//! Release and pull request records produced by a run.
//!
//! Both records are built before their mutating call and enriched exactly
//! once with the fields the server assigns.
use semver::Version;
use serde::Serialize;

use crate::forge::{
    config::DEFAULT_PR_BRANCH_PREFIX,
    request::{CreatedPullRequest, CreatedRelease},
};

/// Path of a component that lives at the repository root.
pub const ROOT_PATH: &str = ".";

/// Derives the tag for `version`: `v<version>`, or `<path>-v<version>` when
/// the component is included and the path is not the repository root.
pub fn tag_name(
    version: &Version,
    path: &str,
    include_component_in_tag: bool,
) -> String {
    if include_component_in_tag && !is_root_path(path) {
        format!("{path}-v{version}")
    } else {
        format!("v{version}")
    }
}

/// Derives the release branch name for `version` targeting `target_branch`.
pub fn release_branch_name(target_branch: &str, version: &Version) -> String {
    format!("{DEFAULT_PR_BRANCH_PREFIX}--{target_branch}--{version}")
}

pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == ROOT_PATH
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    pub path: String,
    pub version: Version,
    /// Commit the tag is created on.
    pub sha: String,
    pub id: Option<u64>,
    pub url: Option<String>,
    pub upload_url: Option<String>,
}

impl Release {
    /// Proposed release for `version` on commit `sha`.
    pub fn new(
        version: Version,
        path: &str,
        include_component_in_tag: bool,
        sha: &str,
        body: String,
    ) -> Self {
        let path = if path.is_empty() { ROOT_PATH } else { path };
        Self {
            tag_name: tag_name(&version, path, include_component_in_tag),
            name: format!("Release {version}"),
            body,
            draft: false,
            prerelease: false,
            path: path.to_string(),
            version,
            sha: sha.to_string(),
            id: None,
            url: None,
            upload_url: None,
        }
    }

    pub fn enrich(self, created: CreatedRelease) -> Self {
        Self {
            id: Some(created.id),
            url: Some(created.url),
            upload_url: Some(created.upload_url),
            ..self
        }
    }
}

/// Body of every release pull request.
pub fn pull_request_body(version: &Version) -> String {
    format!(
        ":robot: I have created a release *beep* *boop*\n\
         ---\n\n\
         This PR was generated to release version {version}.\n\n\
         Merge it to publish the release.\n"
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head_branch_name: String,
    pub base_branch_name: String,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(rename = "html_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PullRequest {
    /// Proposed release pull request for `version` into `target_branch`.
    pub fn new(
        version: &Version,
        target_branch: &str,
        labels: Vec<String>,
    ) -> Self {
        Self {
            title: format!("chore: release {version}"),
            body: pull_request_body(version),
            head_branch_name: release_branch_name(target_branch, version),
            base_branch_name: target_branch.to_string(),
            labels,
            number: None,
            url: None,
        }
    }

    pub fn enrich(self, created: CreatedPullRequest) -> Self {
        Self {
            number: Some(created.number),
            url: Some(created.url),
            ..self
        }
    }
}
