//! Maps created releases and pull requests to flat step outputs and writes
//! them to the runner.
use log::*;
use std::{
    env,
    fs::OpenOptions,
    io::Write,
    path::PathBuf,
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    ReleaseError, Result,
    release::{PullRequest, Release, is_root_path},
};

/// Ordered list of output names and values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs(Vec<(String, String)>);

impl Outputs {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Last value written for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Destination for step outputs.
pub trait OutputSink {
    fn set_output(&mut self, key: &str, value: &str) -> Result<()>;

    fn write_all(&mut self, outputs: &Outputs) -> Result<()> {
        for (key, value) in outputs.iter() {
            debug!("setting output {key}={value}");
            self.set_output(key, value)?;
        }
        Ok(())
    }
}

/// Writes outputs the way GitHub compatible runners (including Gitea
/// Actions) expect them.
pub struct GithubOutput {
    file: Option<PathBuf>,
    delimiter: String,
}

impl GithubOutput {
    /// Uses the file named by `GITHUB_OUTPUT`, falling back to workflow
    /// commands on stdout when the variable is unset.
    pub fn from_env() -> Self {
        let file = env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(file)
    }

    pub fn new(file: Option<PathBuf>) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self {
            file,
            delimiter: format!("ghadelimiter_{}_{nanos}", process::id()),
        }
    }
}

impl OutputSink for GithubOutput {
    fn set_output(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(path) = &self.file else {
            println!("{}", set_output_command(key, value));
            return Ok(());
        };

        if key.contains(&self.delimiter) || value.contains(&self.delimiter) {
            return Err(ReleaseError::invalid_args(format!(
                "output {key} contains the output delimiter"
            )));
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        write!(
            file,
            "{key}<<{delim}\n{value}\n{delim}\n",
            delim = self.delimiter
        )?;
        Ok(())
    }
}

/// Workflow command used when no output file is configured.
fn set_output_command(key: &str, value: &str) -> String {
    format!(
        "::set-output name={}::{}",
        escape_property(key),
        escape_data(value)
    )
}

fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

fn key_prefix(path: &str) -> String {
    if is_root_path(path) {
        String::new()
    } else {
        format!("{path}--")
    }
}

/// Outputs for created releases. `releases_created` is always present and
/// `release_created` falls back to `false` when nothing was released.
pub fn release_outputs(releases: &[Release]) -> Result<Outputs> {
    let mut outputs = Outputs::default();

    for release in releases {
        let prefix = key_prefix(&release.path);
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                outputs.set(format!("{prefix}{key}"), value);
            }
        };

        set("release_created", Some("true".into()));
        set("id", release.id.map(|id| id.to_string()));
        set("name", Some(release.name.clone()));
        set("tag_name", Some(release.tag_name.clone()));
        set("sha", Some(release.sha.clone()).filter(|s| !s.is_empty()));
        set("body", Some(release.body.clone()));
        set("html_url", release.url.clone());
        set("upload_url", release.upload_url.clone());
        set("draft", Some(release.draft.to_string()));
        set("prerelease", Some(release.prerelease.to_string()));
        set("path", Some(release.path.clone()));
        set("version", Some(release.version.to_string()));
        set("major", Some(release.version.major.to_string()));
        set("minor", Some(release.version.minor.to_string()));
        set("patch", Some(release.version.patch.to_string()));
    }

    if releases.is_empty() {
        outputs.set("release_created", "false");
    }

    let paths: Vec<&str> = releases.iter().map(|r| r.path.as_str()).collect();
    outputs.set("releases_created", (!releases.is_empty()).to_string());
    outputs.set("paths_released", serde_json::to_string(&paths)?);

    Ok(outputs)
}

/// Outputs for created pull requests: `prs_created`, the first PR as `pr`
/// and all of them as `prs`.
pub fn pull_request_outputs(prs: &[PullRequest]) -> Result<Outputs> {
    let mut outputs = Outputs::default();

    outputs.set("prs_created", (!prs.is_empty()).to_string());

    if let Some(pr) = prs.first() {
        outputs.set("pr", serde_json::to_string(pr)?);
    }

    outputs.set("prs", serde_json::to_string(prs)?);

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use semver::Version;
    use std::fs;

    use super::*;
    use crate::forge::request::{CreatedPullRequest, CreatedRelease};

    fn created_release(path: &str) -> Release {
        Release::new(
            Version::new(2, 3, 0),
            path,
            true,
            "abc1234",
            "## Changes\n\n".into(),
        )
        .enrich(CreatedRelease {
            id: 12,
            url: "https://gitea.example.com/o/r/releases/tag/v2.3.0".into(),
            upload_url: "https://gitea.example.com/api/v1/repos/o/r/releases/12/assets".into(),
        })
    }

    #[derive(Default)]
    struct MemorySink(Vec<(String, String)>);

    impl OutputSink for MemorySink {
        fn set_output(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.push((key.into(), value.into()));
            Ok(())
        }
    }

    #[test]
    fn root_release_keys_are_unprefixed() {
        let outputs = release_outputs(&[created_release(".")]).unwrap();

        assert_eq!(outputs.get("release_created"), Some("true"));
        assert_eq!(outputs.get("releases_created"), Some("true"));
        assert_eq!(outputs.get("tag_name"), Some("v2.3.0"));
        assert_eq!(outputs.get("name"), Some("Release 2.3.0"));
        assert_eq!(outputs.get("id"), Some("12"));
        assert_eq!(outputs.get("sha"), Some("abc1234"));
        assert_eq!(outputs.get("body"), Some("## Changes\n\n"));
        assert_eq!(
            outputs.get("html_url"),
            Some("https://gitea.example.com/o/r/releases/tag/v2.3.0")
        );
        assert!(outputs.get("upload_url").unwrap().ends_with("/assets"));
        assert_eq!(outputs.get("version"), Some("2.3.0"));
        assert_eq!(outputs.get("major"), Some("2"));
        assert_eq!(outputs.get("minor"), Some("3"));
        assert_eq!(outputs.get("patch"), Some("0"));
        assert_eq!(outputs.get("draft"), Some("false"));
        assert_eq!(outputs.get("paths_released"), Some(r#"["."]"#));
        assert!(outputs.get("url").is_none());
        assert!(outputs.get("tagName").is_none());
    }

    #[test]
    fn component_release_keys_are_prefixed() {
        let outputs = release_outputs(&[created_release("pkgA")]).unwrap();

        assert_eq!(outputs.get("pkgA--release_created"), Some("true"));
        assert_eq!(outputs.get("pkgA--tag_name"), Some("pkgA-v2.3.0"));
        assert!(outputs.get("pkgA--html_url").is_some());
        assert_eq!(outputs.get("pkgA--path"), Some("pkgA"));
        assert!(outputs.get("tag_name").is_none());
        assert_eq!(outputs.get("releases_created"), Some("true"));
        assert_eq!(outputs.get("paths_released"), Some(r#"["pkgA"]"#));
    }

    #[test]
    fn missing_fields_are_omitted() {
        let release = Release::new(
            Version::new(1, 0, 0),
            ".",
            false,
            "",
            "".into(),
        );
        let outputs = release_outputs(&[release]).unwrap();

        assert!(outputs.get("id").is_none());
        assert!(outputs.get("html_url").is_none());
        assert!(outputs.get("upload_url").is_none());
        assert!(outputs.get("sha").is_none());
        assert_eq!(outputs.get("tag_name"), Some("v1.0.0"));
    }

    #[test]
    fn no_releases_emit_false_flags() {
        let outputs = release_outputs(&[]).unwrap();

        assert_eq!(outputs.get("releases_created"), Some("false"));
        assert_eq!(outputs.get("release_created"), Some("false"));
        assert_eq!(outputs.get("paths_released"), Some("[]"));
        assert_eq!(outputs.len(), 3);

        let outputs = pull_request_outputs(&[]).unwrap();
        assert_eq!(outputs.get("prs_created"), Some("false"));
        assert!(outputs.get("pr").is_none());
        assert_eq!(outputs.get("prs"), Some("[]"));
    }

    #[test]
    fn pull_requests_are_json_encoded() {
        let pr = PullRequest::new(
            &Version::new(1, 0, 0),
            "main",
            vec!["autorelease: pending".into()],
        )
        .enrich(CreatedPullRequest {
            number: 7,
            url: "https://gitea.example.com/o/r/pulls/7".into(),
        });

        let outputs = pull_request_outputs(&[pr]).unwrap();
        assert_eq!(outputs.get("prs_created"), Some("true"));

        let value: serde_json::Value =
            serde_json::from_str(outputs.get("pr").unwrap()).unwrap();
        assert_eq!(value["number"], 7);
        assert_eq!(value["html_url"], "https://gitea.example.com/o/r/pulls/7");
        assert_eq!(value["head_branch_name"], "release-please--main--1.0.0");
        assert_eq!(value["base_branch_name"], "main");
        assert_eq!(value["labels"][0], "autorelease: pending");
        assert!(value.get("url").is_none());

        let all: Vec<serde_json::Value> =
            serde_json::from_str(outputs.get("prs").unwrap()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn sink_writes_every_output_in_order() {
        let mut outputs = Outputs::default();
        outputs.set("a", "1");
        outputs.set("b", "2");

        let mut sink = MemorySink::default();
        sink.write_all(&outputs).unwrap();

        assert_eq!(
            sink.0,
            vec![("a".to_string(), "1".to_string()), ("b".into(), "2".into())]
        );
    }

    #[test]
    fn github_output_appends_delimited_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");

        let mut sink = GithubOutput::new(Some(path.clone()));
        sink.set_output("tag_name", "v1.0.0").unwrap();
        sink.set_output("body", "## Changes\n\n- fix (abc1234)").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let delim = sink.delimiter.clone();

        assert_eq!(
            content,
            format!(
                "tag_name<<{delim}\nv1.0.0\n{delim}\n\
                 body<<{delim}\n## Changes\n\n- fix (abc1234)\n{delim}\n"
            )
        );
    }

    #[test]
    fn github_output_rejects_values_containing_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = GithubOutput::new(Some(dir.path().join("output")));
        let value = format!("x{}x", sink.delimiter);

        assert!(sink.set_output("key", &value).is_err());
    }

    #[test]
    fn stdout_fallback_emits_escaped_set_output_commands() {
        assert_eq!(
            set_output_command("tag_name", "v1.0.0"),
            "::set-output name=tag_name::v1.0.0"
        );
        assert_eq!(
            set_output_command("pkg:a,b--body", "## Changes\n\n- 100% done\r\n"),
            "::set-output name=pkg%3Aa%2Cb--body::## Changes%0A%0A- 100%25 done%0D%0A"
        );

        let mut sink = GithubOutput::new(None);
        sink.set_output("body", "line one\nline two").unwrap();
    }

    #[test]
    fn github_output_without_file_env_uses_stdout() {
        temp_env::with_var_unset("GITHUB_OUTPUT", || {
            let mut sink = GithubOutput::from_env();
            assert!(sink.file.is_none());
            sink.set_output("releases_created", "false").unwrap();
        });
    }

    #[test]
    fn escapes_workflow_command_values() {
        assert_eq!(escape_data("a%b\r\nc"), "a%25b%0D%0Ac");
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }
}
