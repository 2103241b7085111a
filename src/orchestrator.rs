//! Sequences a single invocation: resolve one release plan, then create the
//! release and the release pull request, each unless skipped.
//!
//! The plan (next version, target head, latest release) is computed once and
//! shared by both steps.
use log::*;
use semver::Version;
use serde_json::{Map, Value};

use crate::{
    ReleaseError, Result,
    changelog::Changelog,
    config::{ActionInputs, ReleaseSettings, RepoConfig},
    forge::{
        config::PENDING_LABEL,
        request::{
            CreateBranchRequest, CreatePrRequest, CreateReleaseRequest,
            GetCommitsRequest, GetFileContentRequest, LatestRelease,
            PrLabelsRequest, UpdateFileRequest,
        },
        traits::Forge,
    },
    output::{OutputSink, pull_request_outputs, release_outputs},
    release::{PullRequest, Release},
    version::{resolve_next_version, strip_component_prefix},
};


/// Everything both steps need, resolved once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePlan {
    pub settings: ReleaseSettings,
    pub version: Version,
    /// Head commit of the target branch.
    pub head_sha: String,
    pub latest_release: Option<LatestRelease>,
}

/// Records created during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub releases: Vec<Release>,
    pub pull_requests: Vec<PullRequest>,
}

pub struct Orchestrator {
    inputs: ActionInputs,
    forge: Box<dyn Forge>,
}

impl Orchestrator {
    pub fn new(inputs: ActionInputs, forge: Box<dyn Forge>) -> Self {
        Self { inputs, forge }
    }

    /// Runs the invocation. Release outputs are written before the pull
    /// request step starts.
    pub async fn run(&self, sink: &mut dyn OutputSink) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if let Some(release_type) = &self.inputs.release_type {
            info!("release type: {release_type}");
        }

        if self.inputs.skip_gitea_release && self.inputs.skip_gitea_pull_request
        {
            info!("release and pull request creation both skipped");
            sink.write_all(&release_outputs(&summary.releases)?)?;
            sink.write_all(&pull_request_outputs(&summary.pull_requests)?)?;
            return Ok(summary);
        }

        let plan = self.plan().await?;

        info!(
            "next version for {}: {}",
            self.inputs.remote.full_name(),
            plan.version
        );

        if self.inputs.skip_gitea_release {
            info!("skipping release creation");
        } else {
            let release = self.create_release(&plan).await?;
            summary.releases.push(release);
        }

        sink.write_all(&release_outputs(&summary.releases)?)?;

        if self.inputs.skip_gitea_pull_request {
            info!("skipping pull request creation");
        } else {
            let pr = self.create_release_pr(&plan).await?;
            summary.pull_requests.push(pr);
        }

        sink.write_all(&pull_request_outputs(&summary.pull_requests)?)?;

        Ok(summary)
    }

    /// Resolves settings, the target head, the latest release and the next
    /// version.
    pub async fn plan(&self) -> Result<ReleasePlan> {
        let repo_config = self.load_repo_config().await?;
        let settings = ReleaseSettings::resolve(&self.inputs, &repo_config)?;

        debug!(
            "versioning strategy: {}, include component in tag: {}",
            settings.versioning_strategy, settings.include_component_in_tag
        );

        let target = &self.inputs.target_branch;
        let head = self
            .forge
            .get_branch(target)
            .await
            .inspect_err(|e| error!("failed to get branch {target}: {e}"))?
            .ok_or_else(|| {
                ReleaseError::forge(format!("target branch not found: {target}"))
            })?;

        info!("target branch {target} is at {}", head.sha);

        let latest_release = self
            .forge
            .get_latest_release()
            .await
            .inspect_err(|e| error!("failed to get latest release: {e}"))?;

        match &latest_release {
            Some(latest) => info!(
                "latest release: {} ({})",
                latest.tag_name, latest.sha
            ),
            None => info!("no previous release found"),
        }

        let version = match &settings.release_as {
            Some(version) => {
                info!("release-as override: {version}");
                version.clone()
            }
            None => {
                let latest_tag = latest_release.as_ref().map(|latest| {
                    strip_component_prefix(&latest.tag_name, &self.inputs.path)
                });
                resolve_next_version(latest_tag, settings.versioning_strategy)
            }
        };

        Ok(ReleasePlan {
            settings,
            version,
            head_sha: head.sha,
            latest_release,
        })
    }

    async fn load_repo_config(&self) -> Result<RepoConfig> {
        let config_file = self.inputs.config_file.trim();

        if config_file.is_empty() {
            return Ok(RepoConfig::default());
        }

        let content = self
            .forge
            .get_file_content(GetFileContentRequest {
                branch: Some(self.inputs.target_branch.clone()),
                path: config_file.to_string(),
            })
            .await?;

        match content {
            Some(content) => {
                info!("loaded repository config: {config_file}");
                RepoConfig::parse(&content)
            }
            None => {
                debug!("no repository config found at {config_file}");
                Ok(RepoConfig::default())
            }
        }
    }

    /// Generates the changelog since the latest release and publishes the
    /// release on the target head.
    pub async fn create_release(&self, plan: &ReleasePlan) -> Result<Release> {
        let stop_at_sha = plan.latest_release.as_ref().map(|l| l.sha.clone());

        let commits = self
            .forge
            .get_commits(GetCommitsRequest {
                sha: plan.head_sha.clone(),
                stop_at_sha: stop_at_sha.clone(),
                limit: self.inputs.commit_search_depth,
            })
            .await
            .inspect_err(|e| error!("failed to list commits: {e}"))?;

        debug!("fetched {} commits", commits.len());

        let changelog = match self.inputs.commit_link_base_url() {
            Some(base) => Changelog::with_commit_links(base),
            None => Changelog::default(),
        };

        let body = changelog.generate(&commits, stop_at_sha.as_deref());

        let release = Release::new(
            plan.version.clone(),
            &self.inputs.path,
            plan.settings.include_component_in_tag,
            &plan.head_sha,
            body,
        );

        info!("creating release: {}", release.tag_name);

        let created = self
            .forge
            .create_release(CreateReleaseRequest {
                tag_name: release.tag_name.clone(),
                target_commitish: release.sha.clone(),
                name: release.name.clone(),
                body: release.body.clone(),
                draft: release.draft,
                prerelease: release.prerelease,
            })
            .await
            .inspect_err(|e| {
                error!("failed to create release {}: {e}", release.tag_name)
            })?;

        info!("created release {}: {}", release.tag_name, created.url);

        Ok(release.enrich(created))
    }

    /// Creates the release branch (reusing an existing one), records the
    /// version in the manifest, then opens and labels the pull request.
    pub async fn create_release_pr(
        &self,
        plan: &ReleasePlan,
    ) -> Result<PullRequest> {
        let labels = if self.inputs.skip_labeling {
            vec![]
        } else {
            vec![PENDING_LABEL.to_string()]
        };

        let pr = PullRequest::new(
            &plan.version,
            &self.inputs.target_branch,
            labels,
        );

        self.ensure_release_branch(&pr.head_branch_name, &plan.head_sha)
            .await?;

        self.update_manifest(&pr.head_branch_name, &plan.version)
            .await?;

        info!(
            "creating pull request {} -> {}",
            pr.head_branch_name, pr.base_branch_name
        );

        let created = self
            .forge
            .create_pr(CreatePrRequest {
                head_branch: pr.head_branch_name.clone(),
                base_branch: pr.base_branch_name.clone(),
                title: pr.title.clone(),
                body: pr.body.clone(),
            })
            .await
            .inspect_err(|e| error!("failed to create pull request: {e}"))?;

        info!("created pull request #{}: {}", created.number, created.url);

        if !pr.labels.is_empty() {
            info!("adding labels: {}", pr.labels.join(", "));
            self.forge
                .add_pr_labels(PrLabelsRequest {
                    pr_number: created.number,
                    labels: pr.labels.clone(),
                })
                .await
                .inspect_err(|e| {
                    error!(
                        "failed to label pull request #{}: {e}",
                        created.number
                    )
                })?;
        }

        Ok(pr.enrich(created))
    }

    async fn ensure_release_branch(&self, branch: &str, sha: &str) -> Result<()> {
        if self.forge.get_branch(branch).await?.is_some() {
            warn!("release branch {branch} already exists: reusing it");
            return Ok(());
        }

        info!("creating release branch {branch} at {sha}");

        match self
            .forge
            .create_branch(CreateBranchRequest {
                branch: branch.to_string(),
                sha: sha.to_string(),
            })
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_conflict() => {
                warn!("{err}: assuming release branch {branch} is usable");
                Ok(())
            }
            Err(err) => {
                error!("failed to create release branch {branch}: {err}");
                Err(err)
            }
        }
    }

    async fn update_manifest(&self, branch: &str, version: &Version) -> Result<()> {
        let manifest_file = self.inputs.manifest_file.trim();

        if manifest_file.is_empty() {
            return Ok(());
        }

        let existing = self
            .forge
            .get_file_content(GetFileContentRequest {
                branch: Some(branch.to_string()),
                path: manifest_file.to_string(),
            })
            .await?;

        let content = manifest_content(
            existing.as_deref(),
            &self.inputs.path,
            version,
        )?;

        if existing.as_deref() == Some(content.as_str()) {
            debug!("manifest {manifest_file} already at {version}");
            return Ok(());
        }

        info!("updating {manifest_file} on {branch}");

        let commit = self
            .forge
            .update_file(UpdateFileRequest {
                branch: branch.to_string(),
                path: manifest_file.to_string(),
                content,
                message: format!("chore: release {version}"),
            })
            .await
            .inspect_err(|e| error!("failed to update {manifest_file}: {e}"))?;

        if let Some(sha) = commit {
            debug!("manifest commit: {sha}");
        }

        Ok(())
    }
}

/// Manifest JSON with `path` set to `version`, keeping other entries.
pub fn manifest_content(
    existing: Option<&str>,
    path: &str,
    version: &Version,
) -> Result<String> {
    let mut manifest = match existing.map(str::trim) {
        None | Some("") => Map::new(),
        Some(existing) => {
            serde_json::from_str::<Map<String, Value>>(existing).map_err(
                |e| {
                    ReleaseError::invalid_config(format!(
                        "manifest is not a JSON object: {e}"
                    ))
                },
            )?
        }
    };

    manifest.insert(path.to_string(), Value::String(version.to_string()));

    let mut content = serde_json::to_string_pretty(&manifest)?;
    content.push('\n');

    Ok(content)
}
