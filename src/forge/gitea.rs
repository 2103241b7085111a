//! Implements the Forge trait for Gitea
use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};
use log::*;
use reqwest::{
    Client, Proxy, Response, StatusCode, Url,
    header::{HeaderMap, HeaderValue},
};
use secrecy::ExposeSecret;
use std::cmp;

use crate::{
    ReleaseError, Result,
    forge::{
        config::{DEFAULT_LABEL_COLOR, DEFAULT_PAGE_SIZE, RemoteConfig},
        gitea::types::{
            AddIssueLabels, CreateBranch, CreateLabel, CreatePull,
            CreateRelease, GiteaBranch, GiteaCommitQueryObject, GiteaContents,
            GiteaCreatedCommit, GiteaFileChange, GiteaFileChangeOperation,
            GiteaModifyFiles, GiteaPullRequest, GiteaRelease, GiteaTag, Label,
        },
        request::{
            Branch, CreateBranchRequest, CreatePrRequest,
            CreateReleaseRequest, CreatedPullRequest, CreatedRelease,
            ForgeCommit, GetCommitsRequest, GetFileContentRequest,
            LatestRelease, PrLabelsRequest, UpdateFileRequest,
        },
        traits::Forge,
    },
};

mod types;


/// Gitea forge implementation using reqwest for API interactions with
/// branches, commits, releases, pull requests and labels.
pub struct Gitea {
    base_url: Url,
    client: Client,
}

impl Gitea {
    /// Create Gitea client with token authentication, optional proxy and API
    /// base URL configuration for self-hosted instances.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let token = config.token.expose_secret();

        let mut headers = HeaderMap::new();

        let token_value =
            HeaderValue::from_str(format!("token {}", token).as_str())?;

        headers.append("Authorization", token_value);

        let mut builder = reqwest::Client::builder().default_headers(headers);

        if let Some(proxy) = config.proxy_url() {
            debug!("using proxy: {proxy}");
            builder = builder.proxy(Proxy::all(proxy.as_str())?);
        }

        let client = builder.build()?;
        let base_url = config.repo_url()?;

        Ok(Self { base_url, client })
    }

    /// `route` followed by `name` with each `/` separated part
    /// percent-encoded, so names containing `#`, `?` or `%` stay intact.
    fn endpoint(&self, route: &str, name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ReleaseError::forge(format!(
                    "api url cannot be a base: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(route)
            .extend(name.split('/'));
        Ok(url)
    }

    async fn get_file_sha(&self, path: &str, branch: &str) -> Result<String> {
        let mut file_url = self.endpoint("contents", path)?;
        file_url.query_pairs_mut().append_pair("ref", branch);
        let request = self.client.get(file_url).build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let file: GiteaContents = result.json().await?;
        Ok(file.sha)
    }

    async fn get_tag(&self, tag: &str) -> Result<Option<GiteaTag>> {
        let tag_url = self.endpoint("tags", tag)?;
        let request = self.client.get(tag_url).build()?;
        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let result = response.error_for_status()?;
        let tag: GiteaTag = result.json().await?;
        Ok(Some(tag))
    }

    async fn get_all_labels(&self) -> Result<Vec<Label>> {
        let labels_url = self.base_url.join("labels")?;
        let request = self.client.get(labels_url).build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let labels: Vec<Label> = result.json().await?;
        Ok(labels)
    }

    async fn create_label(&self, label_name: String) -> Result<Label> {
        let labels_url = self.base_url.join("labels")?;
        let request = self
            .client
            .post(labels_url)
            .json(&CreateLabel {
                name: label_name,
                color: DEFAULT_LABEL_COLOR.to_string(),
            })
            .build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let label: Label = result.json().await?;
        Ok(label)
    }
}

fn has_more(response: &Response) -> bool {
    response
        .headers()
        .get("x-hasmore")
        .and_then(|h| h.to_str().ok())
        .map(|h| h == "true")
        .unwrap_or(false)
}

#[async_trait]
impl Forge for Gitea {
    async fn get_branch(&self, branch: &str) -> Result<Option<Branch>> {
        let branch_url = self.endpoint("branches", branch)?;
        let request = self.client.get(branch_url).build()?;
        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let result = response.error_for_status()?;
        let branch: GiteaBranch = result.json().await?;
        Ok(Some(Branch {
            name: branch.name,
            sha: branch.commit.id,
        }))
    }

    async fn get_latest_release(&self) -> Result<Option<LatestRelease>> {
        let release_url = self.base_url.join("releases/latest")?;
        let request = self.client.get(release_url).build()?;
        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("no releases found");
            return Ok(None);
        }
        let result = response.error_for_status()?;
        let release: GiteaRelease = result.json().await?;

        // target_commitish is often a branch name, the tag is authoritative
        let sha = match self.get_tag(&release.tag_name).await? {
            Some(tag) => tag.commit.sha,
            None => {
                warn!(
                    "tag {} not found: falling back to release target {}",
                    release.tag_name, release.target_commitish
                );
                release.target_commitish
            }
        };

        Ok(Some(LatestRelease {
            tag_name: release.tag_name,
            sha,
        }))
    }

    async fn get_commits(
        &self,
        req: GetCommitsRequest,
    ) -> Result<Vec<ForgeCommit>> {
        let page_limit = cmp::min(u64::from(DEFAULT_PAGE_SIZE), req.limit);
        let mut commits: Vec<ForgeCommit> = vec![];

        if page_limit == 0 {
            return Ok(commits);
        }

        let mut page = 1;

        loop {
            let mut commits_url = self.base_url.join("commits")?;

            commits_url
                .query_pairs_mut()
                .append_pair("sha", &req.sha)
                .append_pair("limit", &page_limit.to_string())
                .append_pair("page", &page.to_string())
                .append_pair("stat", "false")
                .append_pair("verification", "false")
                .append_pair("files", "false");

            let request = self.client.get(commits_url).build()?;
            let response = self.client.execute(request).await?;
            let more = has_more(&response);
            let result = response.error_for_status()?;
            let results: Vec<GiteaCommitQueryObject> = result.json().await?;

            if results.is_empty() {
                break;
            }

            for result in results.into_iter() {
                if commits.len() as u64 >= req.limit {
                    debug!("reached commit search depth: {}", req.limit);
                    return Ok(commits);
                }

                let reached_stop = req
                    .stop_at_sha
                    .as_ref()
                    .is_some_and(|stop| *stop == result.sha);

                commits.push(ForgeCommit {
                    id: result.sha,
                    message: result.commit.message,
                });

                // the stop commit is kept so callers can tell where the
                // previous release begins
                if reached_stop {
                    return Ok(commits);
                }
            }

            if !more {
                break;
            }

            page += 1;
        }

        Ok(commits)
    }

    async fn get_file_content(
        &self,
        req: GetFileContentRequest,
    ) -> Result<Option<String>> {
        let path = req.path.strip_prefix("./").unwrap_or(&req.path);
        let mut raw_url = self.endpoint("raw", path)?;
        if let Some(branch) = req.branch {
            raw_url.query_pairs_mut().append_pair("ref", &branch);
        }
        let request = self.client.get(raw_url).build()?;
        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let result = response.error_for_status()?;
        let content = result.text().await?;
        Ok(Some(content))
    }

    async fn update_file(
        &self,
        req: UpdateFileRequest,
    ) -> Result<Option<String>> {
        let path = req
            .path
            .strip_prefix("./")
            .unwrap_or(&req.path)
            .to_string();

        let existing_content = self
            .get_file_content(GetFileContentRequest {
                branch: Some(req.branch.clone()),
                path: path.clone(),
            })
            .await?;

        let (operation, sha) = match existing_content {
            Some(existing) if existing == req.content => {
                warn!(
                    "skipping file update content matches existing state: {}",
                    path
                );
                return Ok(None);
            }
            Some(_) => (
                GiteaFileChangeOperation::Update,
                Some(self.get_file_sha(&path, &req.branch).await?),
            ),
            None => (GiteaFileChangeOperation::Create, None),
        };

        let body = GiteaModifyFiles {
            branch: req.branch,
            message: req.message,
            files: vec![GiteaFileChange {
                path,
                content: BASE64_STANDARD.encode(&req.content),
                operation,
                sha,
            }],
        };

        let contents_url = self.base_url.join("contents")?;
        let request = self.client.post(contents_url).json(&body).build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let created: GiteaCreatedCommit = result.json().await?;

        Ok(Some(created.commit.sha))
    }

    async fn create_branch(&self, req: CreateBranchRequest) -> Result<()> {
        let body = CreateBranch {
            new_branch_name: req.branch.clone(),
            old_ref_name: req.sha,
        };
        let branches_url = self.base_url.join("branches")?;
        let request = self.client.post(branches_url).json(&body).build()?;
        let response = self.client.execute(request).await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(ReleaseError::conflict(format!(
                "branch already exists: refs/heads/{}",
                req.branch
            )));
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<CreatedRelease> {
        let data = CreateRelease {
            tag_name: req.tag_name,
            target_commitish: req.target_commitish,
            name: req.name,
            body: req.body,
            draft: req.draft,
            prerelease: req.prerelease,
        };

        let releases_url = self.base_url.join("releases")?;
        let request = self.client.post(releases_url).json(&data).build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let release: GiteaRelease = result.json().await?;

        let upload_url = match release.upload_url {
            Some(url) => url,
            None => self
                .base_url
                .join(&format!("releases/{}/assets", release.id))?
                .to_string(),
        };

        Ok(CreatedRelease {
            id: release.id,
            url: release.html_url,
            upload_url,
        })
    }

    async fn create_pr(
        &self,
        req: CreatePrRequest,
    ) -> Result<CreatedPullRequest> {
        let data = CreatePull {
            title: req.title,
            body: req.body,
            head: req.head_branch,
            base: req.base_branch,
        };
        let pulls_url = self.base_url.join("pulls")?;
        let request = self.client.post(pulls_url).json(&data).build()?;
        let response = self.client.execute(request).await?;
        let result = response.error_for_status()?;
        let pr: GiteaPullRequest = result.json().await?;

        Ok(CreatedPullRequest {
            number: pr.number,
            url: pr.html_url,
        })
    }

    async fn add_pr_labels(&self, req: PrLabelsRequest) -> Result<()> {
        let all_labels = self.get_all_labels().await?;

        let mut labels = vec![];

        for name in req.labels {
            if let Some(label) = all_labels.iter().find(|l| l.name == name) {
                labels.push(label.id);
            } else {
                debug!("creating missing label: {name}");
                let label = self.create_label(name).await?;
                labels.push(label.id);
            }
        }

        let data = AddIssueLabels { labels };

        let labels_url = self
            .base_url
            .join(format!("issues/{}/labels", req.pr_number).as_str())?;

        let request = self.client.post(labels_url).json(&data).build()?;
        let response = self.client.execute(request).await?;
        response.error_for_status()?;

        Ok(())
    }
}
