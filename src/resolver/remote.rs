//! Remote repository URL layout

use crate::error::{AlbtError, Result};

const GITHUB_PREFIX: &str = "https://github.com/";
const GITHUB_API: &str = "https://api.github.com/repos";

/// A repository publishing overlay archives
///
/// Either a GitHub repository or a directory (`file://`, plain http) mirroring
/// GitHub's archive layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    base: String,
    github: Option<(String, String)>,
}

impl Remote {
    pub fn parse(url: &str) -> Result<Self> {
        let base = url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(AlbtError::ConfigInvalid {
                message: "remote URL must not be empty".to_string(),
            });
        }

        let github = base.strip_prefix(GITHUB_PREFIX).map(|path| {
            let path = path.trim_end_matches(".git");
            let mut parts = path.splitn(2, '/');
            let owner = parts.next().unwrap_or_default().to_string();
            let repo = parts.next().unwrap_or_default().to_string();
            (owner, repo)
        });
        if let Some((owner, repo)) = &github {
            if owner.is_empty() || repo.is_empty() || repo.contains('/') {
                return Err(AlbtError::ConfigInvalid {
                    message: format!("expected https://github.com/<owner>/<repo>, got '{url}'"),
                });
            }
        }

        let base = match &github {
            Some((owner, repo)) => format!("{GITHUB_PREFIX}{owner}/{repo}"),
            None => base,
        };
        Ok(Self { base, github })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Archive URL of a tag
    pub fn tag_archive(&self, reference: &str, ext: &str) -> String {
        format!("{}/archive/refs/tags/{reference}.{ext}", self.base)
    }

    /// Archive URL of a branch
    pub fn branch_archive(&self, reference: &str, ext: &str) -> String {
        format!("{}/archive/refs/heads/{reference}.{ext}", self.base)
    }

    /// Archive URL of any ref (commit SHA, ambiguous names)
    pub fn ref_archive(&self, reference: &str, ext: &str) -> String {
        format!("{}/archive/{reference}.{ext}", self.base)
    }

    /// Release listing endpoint, newest first
    pub fn releases_url(&self) -> String {
        match &self.github {
            Some((owner, repo)) => format!("{GITHUB_API}/{owner}/{repo}/releases"),
            None => format!("{}/releases.json", self.base),
        }
    }
}
