//! Normalized request and response types shared by forge implementations.
use derive_builder::Builder;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A branch and the commit at its head.
pub struct Branch {
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Latest published release and the commit its tag points to.
pub struct LatestRelease {
    pub tag_name: String,
    pub sha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
#[builder(setter(into), default)]
/// Represents a normalized commit returned from any forge
pub struct ForgeCommit {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone)]
/// Request to list commits reachable from `sha`, newest first.
pub struct GetCommitsRequest {
    pub sha: String,
    /// Stop paging once this commit has been fetched.
    pub stop_at_sha: Option<String>,
    /// Maximum number of commits to return. `u64::MAX` means no limit.
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct GetFileContentRequest {
    pub branch: Option<String>,
    /// Relative path to the file starting from repo root
    pub path: String,
}

#[derive(Debug, Clone)]
/// Request to create or replace a single file on an existing branch.
pub struct UpdateFileRequest {
    pub branch: String,
    pub path: String,
    pub content: String,
    pub message: String,
}

#[derive(Debug, Clone)]
/// Request to create `refs/heads/<branch>` at `sha`.
pub struct CreateBranchRequest {
    pub branch: String,
    pub sha: String,
}

#[derive(Debug, Clone)]
pub struct CreateReleaseRequest {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Server-assigned fields of a newly created release.
pub struct CreatedRelease {
    pub id: u64,
    pub url: String,
    pub upload_url: String,
}

#[derive(Debug, Clone)]
/// Request to create a new pull request.
pub struct CreatePrRequest {
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Server-assigned fields of a newly created pull request.
pub struct CreatedPullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone)]
/// Request to add labels to a pull request.
pub struct PrLabelsRequest {
    pub pr_number: u64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
}
