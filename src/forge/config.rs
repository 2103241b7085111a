//! Configuration for the Gitea API connection.
use secrecy::SecretString;
use url::Url;

use crate::{ReleaseError, Result};

/// Page size for paginated commit queries
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// Default number of commits fetched for a changelog (a single page).
pub const DEFAULT_COMMIT_SEARCH_DEPTH: u64 = DEFAULT_PAGE_SIZE as u64;
/// Branch name prefix for release PRs.
pub const DEFAULT_PR_BRANCH_PREFIX: &str = "release-please";
/// Default color for created labels in hex format.
pub const DEFAULT_LABEL_COLOR: &str = "ededed";
/// Label applied to release PRs while waiting for merge.
pub const PENDING_LABEL: &str = "autorelease: pending";

/// Remote repository connection configuration for authenticating and
/// interacting with the Gitea API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// API base URL, e.g. `https://gitea.example.com/api/v1`.
    pub api_url: Url,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// Optional HTTP(S) proxy, with or without a scheme.
    pub proxy: Option<String>,
}

impl RemoteConfig {
    /// Base URL for repository scoped endpoints, always ending with `/`.
    pub fn repo_url(&self) -> Result<Url> {
        let base = self.api_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!(
            "{base}/repos/{}/{}/",
            self.owner, self.repo
        ))?;
        Ok(url)
    }

    /// Proxy URL with an `http://` scheme added when none was given.
    pub fn proxy_url(&self) -> Option<String> {
        self.proxy.as_ref().map(|proxy| {
            if proxy.contains("://") {
                proxy.clone()
            } else {
                format!("http://{proxy}")
            }
        })
    }

    /// Full repository name in `owner/repo` form.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Parses an API base URL, accepting only http and https.
pub fn parse_api_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ReleaseError::invalid_config(format!(
            "only http and https schemes are supported for the api url, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(api_url: &str, proxy: Option<&str>) -> RemoteConfig {
        RemoteConfig {
            api_url: parse_api_url(api_url).unwrap(),
            owner: "owner".into(),
            repo: "repo".into(),
            token: SecretString::from("token".to_string()),
            proxy: proxy.map(String::from),
        }
    }

    #[test]
    fn repo_url_handles_trailing_slash() {
        let expected = "https://gitea.example.com/api/v1/repos/owner/repo/";
        assert_eq!(
            remote("https://gitea.example.com/api/v1", None)
                .repo_url()
                .unwrap()
                .as_str(),
            expected
        );
        assert_eq!(
            remote("https://gitea.example.com/api/v1/", None)
                .repo_url()
                .unwrap()
                .as_str(),
            expected
        );
    }

    #[test]
    fn proxy_gets_default_scheme() {
        assert_eq!(
            remote("https://g.com/api/v1", Some("proxy.local:3128"))
                .proxy_url()
                .unwrap(),
            "http://proxy.local:3128"
        );
        assert_eq!(
            remote("https://g.com/api/v1", Some("https://proxy.local"))
                .proxy_url()
                .unwrap(),
            "https://proxy.local"
        );
        assert!(remote("https://g.com/api/v1", None).proxy_url().is_none());
    }

    #[test]
    fn only_supports_http_and_https_schemes() {
        assert!(parse_api_url("ssh://gitea.example.com/api/v1").is_err());
        assert!(parse_api_url("not a url").is_err());
    }
}
