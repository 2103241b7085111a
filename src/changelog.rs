//! Changelog text generated from a newest-first commit list.
//!
//! The list is whatever the forge returned: when it was truncated before the
//! previous release commit, older commits are silently missing.
use crate::forge::request::ForgeCommit;

/// Heading of every generated changelog.
pub const CHANGELOG_HEADING: &str = "## Changes";

/// Number of characters in an abbreviated commit id.
pub const SHORT_SHA_LEN: usize = 7;

/// Renders commit lists as markdown bullet lists.
#[derive(Debug, Clone, Default)]
pub struct Changelog {
    commit_link_base_url: Option<String>,
}

impl Changelog {
    /// Render abbreviated ids as links to `<base>/<sha>`.
    pub fn with_commit_links(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            commit_link_base_url: Some(base.trim_end_matches('/').to_string()),
        }
    }

    /// One bullet per commit until `stop_at_sha` is reached (exclusive).
    pub fn generate(
        &self,
        commits: &[ForgeCommit],
        stop_at_sha: Option<&str>,
    ) -> String {
        let mut out = format!("{CHANGELOG_HEADING}\n\n");

        for commit in commits {
            if stop_at_sha.is_some_and(|stop| stop == commit.id) {
                break;
            }

            let short_id = short_sha(&commit.id);

            let line = match &self.commit_link_base_url {
                Some(base) => format!(
                    "- {} ([{short_id}]({base}/{}))\n",
                    subject(&commit.message),
                    commit.id
                ),
                None => format!("- {} ({short_id})\n", subject(&commit.message)),
            };

            out.push_str(&line);
        }

        out
    }
}

/// Changelog for `commits` without commit links.
pub fn generate_changelog(
    commits: &[ForgeCommit],
    stop_at_sha: Option<&str>,
) -> String {
    Changelog::default().generate(commits, stop_at_sha)
}

fn subject(message: &str) -> &str {
    message.lines().next().unwrap_or_default().trim()
}

fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}
