//! Common test utilities for orchestrator tests.
use secrecy::SecretString;

use crate::{
    Result,
    config::{ActionInputs, ActionInputsParamsBuilder},
    forge::{
        request::{Branch, CreatedPullRequest, CreatedRelease, LatestRelease},
        traits::MockForge,
    },
    orchestrator::Orchestrator,
    output::OutputSink,
};

pub const HEAD_SHA: &str = "1111111aaaaaaa";
pub const PREVIOUS_SHA: &str = "0000000fffffff";

/// Collects outputs in write order.
#[derive(Debug, Default)]
pub struct MemorySink(pub Vec<(String, String)>);

impl MemorySink {
    /// Last value written for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k == key)
    }
}

impl OutputSink for MemorySink {
    fn set_output(&mut self, key: &str, value: &str) -> Result<()> {
        self.0.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

/// Inputs with config and manifest files disabled so tests only need to set
/// up the calls they care about.
pub fn inputs() -> ActionInputsParamsBuilder {
    let mut builder = ActionInputs::builder();
    builder
        .token(SecretString::from("token".to_string()))
        .api_url("https://gitea.example.com/api/v1")
        .owner("owner")
        .repo("repo")
        .config_file("")
        .manifest_file("");
    builder
}

pub fn create_test_orchestrator(
    mock_forge: MockForge,
    builder: &ActionInputsParamsBuilder,
) -> Orchestrator {
    Orchestrator::new(builder.build().unwrap(), Box::new(mock_forge))
}

/// Expects a single lookup of the `main` branch at [`HEAD_SHA`].
pub fn expect_target_branch(mock_forge: &mut MockForge) {
    mock_forge
        .expect_get_branch()
        .withf(|branch| branch == "main")
        .times(1)
        .returning(|branch| {
            Ok(Some(Branch {
                name: branch.to_string(),
                sha: HEAD_SHA.to_string(),
            }))
        });
}

pub fn expect_latest_release(mock_forge: &mut MockForge, tag: Option<&str>) {
    let latest = tag.map(|tag| LatestRelease {
        tag_name: tag.to_string(),
        sha: PREVIOUS_SHA.to_string(),
    });

    mock_forge
        .expect_get_latest_release()
        .times(1)
        .returning(move || Ok(latest.clone()));
}

pub fn created_release(id: u64) -> CreatedRelease {
    CreatedRelease {
        id,
        url: format!("https://gitea.example.com/owner/repo/releases/{id}"),
        upload_url: format!(
            "https://gitea.example.com/api/v1/repos/owner/repo/releases/{id}/assets"
        ),
    }
}

pub fn created_pr(number: u64) -> CreatedPullRequest {
    CreatedPullRequest {
        number,
        url: format!("https://gitea.example.com/owner/repo/pulls/{number}"),
    }
}
