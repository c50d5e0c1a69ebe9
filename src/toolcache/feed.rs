//! Package sources: version listing and installation

use std::path::Path;

use serde::Deserialize;

use crate::error::{AlbtError, Result};
use crate::process::CommandRunner;
use crate::retry::{self, RetryPolicy};
use crate::transport::Transport;

/// Lists published versions of a package
pub trait PackageFeed {
    /// All published versions, in feed order; empty when the package is unknown
    fn versions(&self, package_id: &str) -> Result<Vec<String>>;
}

/// Installs one version of a package into a directory
pub trait PackageInstaller {
    fn install(&self, package_id: &str, version: &str, target: &Path) -> Result<()>;
}

#[derive(Deserialize)]
struct VersionIndex {
    versions: Vec<String>,
}

/// NuGet v3 flat-container feed
pub struct NugetFeed<'a> {
    transport: &'a dyn Transport,
    base_url: String,
    retry: RetryPolicy,
}

impl<'a> NugetFeed<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn index_url(&self, package_id: &str) -> String {
        format!("{}/{}/index.json", self.base_url, package_id.to_lowercase())
    }
}

impl PackageFeed for NugetFeed<'_> {
    fn versions(&self, package_id: &str) -> Result<Vec<String>> {
        let url = self.index_url(package_id);
        let body = match retry::with_retry(
            "package versions",
            &self.retry,
            || self.transport.get(&url),
            retry::is_transient,
        ) {
            Ok(body) => body,
            Err(AlbtError::NotFound { .. }) => {
                tracing::debug!(%url, "package not on feed");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let index: VersionIndex = serde_json::from_slice(&body).map_err(|e| AlbtError::Unknown {
            message: format!("unreadable version index {url}: {e}"),
        })?;
        Ok(index.versions)
    }
}

/// Installs packages as .NET tools with `dotnet tool install --tool-path`
pub struct DotnetToolInstaller<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> DotnetToolInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl PackageInstaller for DotnetToolInstaller<'_> {
    fn install(&self, package_id: &str, version: &str, target: &Path) -> Result<()> {
        let target_str = target.to_string_lossy();
        let args = [
            "tool",
            "install",
            package_id,
            "--version",
            version,
            "--tool-path",
            target_str.as_ref(),
        ];
        let output = self
            .runner
            .output("dotnet", &args)
            .map_err(|e| AlbtError::InstallationFailure {
                package: package_id.to_string(),
                reason: e.to_string(),
            })?;
        if output.success() {
            Ok(())
        } else {
            Err(AlbtError::InstallationFailure {
                package: package_id.to_string(),
                reason: format!("dotnet tool install failed: {}", output.summary()),
            })
        }
    }
}
