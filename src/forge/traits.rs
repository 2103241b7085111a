//! Traits related to remote git forges
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::request::{
        Branch, CreateBranchRequest, CreatePrRequest, CreateReleaseRequest,
        CreatedPullRequest, CreatedRelease, ForgeCommit, GetCommitsRequest,
        GetFileContentRequest, LatestRelease, PrLabelsRequest,
        UpdateFileRequest,
    },
};

/// Narrow typed surface of the hosting API used by the orchestrator.
///
/// Lookups that may legitimately find nothing return `Ok(None)`; only real
/// failures are errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge {
    async fn get_branch(&self, branch: &str) -> Result<Option<Branch>>;

    async fn get_latest_release(&self) -> Result<Option<LatestRelease>>;

    async fn get_commits(
        &self,
        req: GetCommitsRequest,
    ) -> Result<Vec<ForgeCommit>>;

    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>>;

    /// Creates or replaces a file on a branch. Returns `None` when the file
    /// already holds the requested content and no commit was made.
    async fn update_file(&self, req: UpdateFileRequest)
    -> Result<Option<String>>;

    /// Fails with [`crate::ReleaseError::Conflict`] when the branch exists.
    async fn create_branch(&self, req: CreateBranchRequest) -> Result<()>;

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<CreatedRelease>;

    async fn create_pr(&self, req: CreatePrRequest)
    -> Result<CreatedPullRequest>;

    async fn add_pr_labels(&self, req: PrLabelsRequest) -> Result<()>;
}
