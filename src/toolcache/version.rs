//! Compiler version parsing and selection

use std::cmp::Ordering;
use std::fmt;

use crate::error::{AlbtError, Result};

/// Runtime majors whose compiler ships under a different major
///
/// Runtimes not listed use the compiler with the same major.
const COMPATIBILITY_REMAPS: &[(u64, u64)] = &[(15, 16)];

/// A dotted numeric package version with optional prerelease label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion {
    parts: Vec<u64>,
    prerelease: Option<String>,
    raw: String,
}

impl ToolVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (core, prerelease) = match raw.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (raw, None),
        };
        // build metadata carries no ordering
        let core = core.split('+').next().unwrap_or(core);
        let parts = core
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            parts,
            prerelease,
            raw: raw.to_string(),
        })
    }

    pub fn major(&self) -> u64 {
        self.parts[0]
    }

    pub fn is_stable(&self) -> bool {
        self.prerelease.is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Major version of a runtime string such as `16.0`
pub fn runtime_major(runtime: &str) -> Result<u64> {
    runtime
        .trim()
        .split('.')
        .next()
        .and_then(|m| m.parse().ok())
        .ok_or_else(|| AlbtError::ConfigInvalid {
            message: format!("runtime must look like '<major>.<minor>', got '{runtime}'"),
        })
}

/// Compiler major required by a runtime major
pub fn tool_major_for_runtime(runtime_major: u64) -> u64 {
    COMPATIBILITY_REMAPS
        .iter()
        .find(|(runtime, _)| *runtime == runtime_major)
        .map_or(runtime_major, |(_, tool)| *tool)
}

/// How a version was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Explicit(String),
    ForRuntime { version: String, tool_major: u64 },
    Latest(String),
}

impl Selection {
    pub fn version(&self) -> &str {
        match self {
            Self::Explicit(v) | Self::Latest(v) | Self::ForRuntime { version: v, .. } => v,
        }
    }
}

/// Pick the newest stable version whose major is `tool_major`
///
/// Never falls back to another major.
pub fn newest_for_major(available: &[String], tool_major: u64) -> Option<ToolVersion> {
    available
        .iter()
        .filter_map(|v| ToolVersion::parse(v))
        .filter(|v| v.is_stable() && v.major() == tool_major)
        .max()
}

pub fn newest_stable(available: &[String]) -> Option<ToolVersion> {
    available
        .iter()
        .filter_map(|v| ToolVersion::parse(v))
        .filter(ToolVersion::is_stable)
        .max()
}

/// Choose a version from `available` for a runtime request
///
/// # Errors
///
/// `VersionNotFound` when nothing matches; an incompatible version is never chosen.
pub fn select_for(package: &str, available: &[String], runtime: Option<&str>) -> Result<Selection> {
    match runtime {
        Some(runtime) => {
            let tool_major = tool_major_for_runtime(runtime_major(runtime)?);
            newest_for_major(available, tool_major)
                .map(|v| Selection::ForRuntime {
                    version: v.to_string(),
                    tool_major,
                })
                .ok_or_else(|| AlbtError::VersionNotFound {
                    package: package.to_string(),
                    constraint: format!("major {tool_major} (runtime {runtime})"),
                })
        }
        None => newest_stable(available)
            .map(|v| Selection::Latest(v.to_string()))
            .ok_or_else(|| AlbtError::VersionNotFound {
                package: package.to_string(),
                constraint: "any stable version".to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_numeric_ordering() {
        let a = ToolVersion::parse("16.0.9").unwrap();
        let b = ToolVersion::parse("16.0.10").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_prerelease_sorts_before_release() {
        let pre = ToolVersion::parse("17.0.0-beta").unwrap();
        let rel = ToolVersion::parse("17.0.0").unwrap();
        assert!(pre < rel);
        assert!(!pre.is_stable());
    }

    #[test]
    fn test_unparseable_version() {
        assert!(ToolVersion::parse("latest").is_none());
        assert!(ToolVersion::parse("").is_none());
    }

    #[test]
    fn test_runtime_major() {
        assert_eq!(runtime_major("16.0").unwrap(), 16);
        assert!(runtime_major("sixteen").is_err());
    }

    #[test]
    fn test_remap_table() {
        assert_eq!(tool_major_for_runtime(15), 16);
        assert_eq!(tool_major_for_runtime(14), 14);
    }

    #[test]
    fn test_select_for_runtime_picks_newest_stable_in_major() {
        let available = versions(&["15.2.1", "16.0.5", "16.1.2", "16.2.0-rc1", "17.0.1"]);
        let selection = select_for("pkg", &available, Some("16.0")).unwrap();
        assert_eq!(selection.version(), "16.1.2");
    }

    #[test]
    fn test_no_fallback_to_other_major() {
        let available = versions(&["14.0.1", "17.0.1", "16.0.0-preview"]);
        let err = select_for("pkg", &available, Some("16.0")).unwrap_err();
        assert!(matches!(err, AlbtError::VersionNotFound { .. }));
    }

    #[test]
    fn test_latest_without_runtime() {
        let available = versions(&["15.0.1", "17.0.0-beta", "16.3.0"]);
        assert_eq!(
            select_for("pkg", &available, None).unwrap(),
            Selection::Latest("16.3.0".to_string())
        );
    }

    #[test]
    fn test_empty_list_is_version_not_found() {
        assert!(select_for("pkg", &[], None).is_err());
        assert!(select_for("pkg", &[], Some("16.0")).is_err());
    }
}
