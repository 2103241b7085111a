use serde::{Deserialize, Serialize};

use crate::forge::request::Commit;

#[derive(Debug, Default, Serialize)]
pub struct CreateLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AddIssueLabels {
    pub labels: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreatePull {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Deserialize)]
pub struct GiteaPullRequest {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRelease {
    pub tag_name: String,
    pub target_commitish: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Deserialize)]
pub struct GiteaRelease {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub target_commitish: String,
    pub html_url: String,
    #[serde(default)]
    pub upload_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GiteaCommit {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GiteaCommitQueryObject {
    pub sha: String,
    pub commit: GiteaCommit,
}

#[derive(Debug, Deserialize)]
pub struct GiteaTagCommit {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub struct GiteaTag {
    pub commit: GiteaTagCommit,
}

#[derive(Debug, Deserialize)]
pub struct GiteaBranchCommit {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct GiteaBranch {
    pub name: String,
    pub commit: GiteaBranchCommit,
}

#[derive(Debug, Serialize)]
pub struct CreateBranch {
    pub new_branch_name: String,
    pub old_ref_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GiteaContents {
    pub sha: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GiteaFileChangeOperation {
    Create,
    Update,
}

#[derive(Debug, Serialize)]
pub struct GiteaFileChange {
    pub path: String,
    pub content: String,
    pub operation: GiteaFileChangeOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GiteaModifyFiles {
    pub branch: String,
    pub message: String,
    pub files: Vec<GiteaFileChange>,
}

#[derive(Debug, Deserialize)]
pub struct GiteaCreatedCommit {
    pub commit: Commit,
}
