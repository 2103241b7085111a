//! Next-version resolution from the latest published release tag.
//!
//! Tag parsing is lenient: a malformed or missing component reads as `0`.

use log::*;
use semver::Version;
use std::fmt;

use crate::Result;

/// Version of the first release when no prior release exists.
pub const INITIAL_VERSION: Version = Version::new(1, 0, 0);

/// Policy for which component of the version to increment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersioningStrategy {
    AlwaysBumpMajor,
    AlwaysBumpMinor,
    #[default]
    AlwaysBumpPatch,
}

impl From<&str> for VersioningStrategy {
    /// Unrecognized strategy names fall back to a patch bump.
    fn from(value: &str) -> Self {
        match value.trim() {
            "always-bump-major" => Self::AlwaysBumpMajor,
            "always-bump-minor" => Self::AlwaysBumpMinor,
            "always-bump-patch" => Self::AlwaysBumpPatch,
            other => {
                if !other.is_empty() && other != "default" {
                    warn!(
                        "unrecognized versioning strategy \"{other}\": using always-bump-patch"
                    );
                }
                Self::AlwaysBumpPatch
            }
        }
    }
}

impl fmt::Display for VersioningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AlwaysBumpMajor => "always-bump-major",
            Self::AlwaysBumpMinor => "always-bump-minor",
            Self::AlwaysBumpPatch => "always-bump-patch",
        };
        write!(f, "{name}")
    }
}

/// Computes the version that follows `latest_tag` under `strategy`.
///
/// Returns [`INITIAL_VERSION`] when there is no prior release, regardless of
/// strategy.
pub fn resolve_next_version(
    latest_tag: Option<&str>,
    strategy: VersioningStrategy,
) -> Version {
    let Some(tag) = latest_tag else {
        return INITIAL_VERSION;
    };

    let current = parse_lenient(tag);

    let next = match strategy {
        VersioningStrategy::AlwaysBumpMajor => {
            Version::new(current.major.saturating_add(1), 0, 0)
        }
        VersioningStrategy::AlwaysBumpMinor => {
            Version::new(current.major, current.minor.saturating_add(1), 0)
        }
        VersioningStrategy::AlwaysBumpPatch => {
            Version::new(
                current.major,
                current.minor,
                current.patch.saturating_add(1),
            )
        }
    };

    if next == current {
        warn!("version component of {tag} is at its maximum: not bumped");
    }

    next
}

fn parse_lenient(tag: &str) -> Version {
    let raw = tag.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);

    let mut parts = raw.split('.').map(|p| p.parse::<u64>().unwrap_or(0));

    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);

    Version::new(major, minor, patch)
}

/// Removes a leading `<component>-` from a component-prefixed tag such as
/// `pkgA-v1.2.3`. Tags without the prefix are returned unchanged.
pub fn strip_component_prefix<'a>(tag: &'a str, component: &str) -> &'a str {
    if component.is_empty() {
        return tag;
    }
    tag.strip_prefix(component)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(tag)
}

/// Validates an explicit release-as override. A leading `v` is accepted.
pub fn parse_release_as(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    Ok(Version::parse(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_release_is_one_zero_zero_for_every_strategy() {
        for strategy in [
            VersioningStrategy::AlwaysBumpMajor,
            VersioningStrategy::AlwaysBumpMinor,
            VersioningStrategy::AlwaysBumpPatch,
        ] {
            assert_eq!(
                resolve_next_version(None, strategy),
                Version::new(1, 0, 0)
            );
        }
    }

    #[test]
    fn bumps_each_component() {
        assert_eq!(
            resolve_next_version(
                Some("v1.2.3"),
                VersioningStrategy::AlwaysBumpMajor
            ),
            Version::new(2, 0, 0)
        );
        assert_eq!(
            resolve_next_version(
                Some("v1.2.3"),
                VersioningStrategy::AlwaysBumpMinor
            ),
            Version::new(1, 3, 0)
        );
        assert_eq!(
            resolve_next_version(
                Some("v1.2.3"),
                VersioningStrategy::AlwaysBumpPatch
            ),
            Version::new(1, 2, 4)
        );
    }

    #[test]
    fn leading_v_is_optional() {
        assert_eq!(
            resolve_next_version(
                Some("0.9.9"),
                VersioningStrategy::AlwaysBumpPatch
            ),
            Version::new(0, 9, 10)
        );
    }

    #[test]
    fn malformed_components_read_as_zero() {
        assert_eq!(
            resolve_next_version(Some("v2.x"), VersioningStrategy::default()),
            Version::new(2, 0, 1)
        );
        assert_eq!(
            resolve_next_version(
                Some("garbage"),
                VersioningStrategy::AlwaysBumpMinor
            ),
            Version::new(0, 1, 0)
        );
        assert_eq!(
            resolve_next_version(Some(""), VersioningStrategy::AlwaysBumpMajor),
            Version::new(1, 0, 0)
        );
    }

    #[test]
    fn maximum_components_saturate_instead_of_overflowing() {
        let max = u64::MAX;

        assert_eq!(
            resolve_next_version(
                Some("v18446744073709551615.0.0"),
                VersioningStrategy::AlwaysBumpMajor
            ),
            Version::new(max, 0, 0)
        );
        assert_eq!(
            resolve_next_version(
                Some("v1.18446744073709551615.7"),
                VersioningStrategy::AlwaysBumpMinor
            ),
            Version::new(1, max, 0)
        );
        assert_eq!(
            resolve_next_version(
                Some("v1.2.18446744073709551615"),
                VersioningStrategy::AlwaysBumpPatch
            ),
            Version::new(1, 2, max)
        );
    }

    #[test]
    fn strategy_parsing_falls_back_to_patch() {
        assert_eq!(
            VersioningStrategy::from("always-bump-major"),
            VersioningStrategy::AlwaysBumpMajor
        );
        assert_eq!(
            VersioningStrategy::from("always-bump-minor"),
            VersioningStrategy::AlwaysBumpMinor
        );
        assert_eq!(
            VersioningStrategy::from("always-bump-patch"),
            VersioningStrategy::AlwaysBumpPatch
        );
        assert_eq!(
            VersioningStrategy::from("default"),
            VersioningStrategy::AlwaysBumpPatch
        );
        assert_eq!(
            VersioningStrategy::from("bump-everything"),
            VersioningStrategy::AlwaysBumpPatch
        );
        assert_eq!(
            resolve_next_version(
                Some("v3.1.4"),
                VersioningStrategy::from("not-a-strategy")
            ),
            Version::new(3, 1, 5)
        );
    }

    #[test]
    fn strategy_display_round_trips_names() {
        assert_eq!(
            VersioningStrategy::AlwaysBumpMinor.to_string(),
            "always-bump-minor"
        );
    }

    #[test]
    fn strips_component_prefix_only_when_present() {
        assert_eq!(strip_component_prefix("pkgA-v1.2.3", "pkgA"), "v1.2.3");
        assert_eq!(strip_component_prefix("v1.2.3", "pkgA"), "v1.2.3");
        assert_eq!(strip_component_prefix("pkgAB-v1.0.0", "pkgA"), "pkgAB-v1.0.0");
        assert_eq!(strip_component_prefix("v1.2.3", ""), "v1.2.3");
    }

    #[test]
    fn release_as_must_be_a_valid_semver() {
        assert_eq!(parse_release_as("v2.0.0").unwrap(), Version::new(2, 0, 0));
        assert_eq!(
            parse_release_as("3.0.0-rc.1").unwrap().to_string(),
            "3.0.0-rc.1"
        );
        assert!(parse_release_as("2.x").is_err());
    }
}
