//! Compiler provisioning operation

use std::path::PathBuf;

use super::{Services, retry_policy};
use crate::config::Config;
use crate::error::Result;
use crate::toolcache::{
    DotnetToolInstaller, NugetFeed, ProvisionRequest, ToolCache, ToolSentinel, runtime,
};

#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    /// Project searched for `app.json` when no runtime is given
    pub project_root: PathBuf,
    pub runtime: Option<String>,
    pub compiler_version: Option<String>,
}

impl ProvisionOptions {
    /// Explicit runtime, else the one declared by the project's `app.json`
    pub fn request(&self) -> ProvisionRequest {
        let runtime = self.runtime.clone().or_else(|| {
            let detected = runtime::detect_runtime(&self.project_root);
            if detected.is_none() {
                tracing::debug!(
                    root = %self.project_root.display(),
                    "no runtime in app.json, selecting newest stable compiler"
                );
            }
            detected
        });
        ProvisionRequest {
            runtime,
            version: self.compiler_version.clone(),
        }
    }
}

pub struct ProvisionOperation<'a> {
    config: &'a Config,
    services: Services<'a>,
}

impl<'a> ProvisionOperation<'a> {
    pub fn new(config: &'a Config, services: Services<'a>) -> Self {
        Self { config, services }
    }

    pub fn execute(&self, options: &ProvisionOptions) -> Result<ToolSentinel> {
        let feed = NugetFeed::new(
            self.services.transport,
            &self.config.nuget_feed,
            retry_policy(self.config),
        );
        let installer = DotnetToolInstaller::new(self.services.runner);
        let cache = ToolCache::new(
            self.config.cache_root.clone(),
            self.config.package_id.as_deref(),
            &feed,
            &installer,
            self.services.emitter,
        );
        let sentinel = cache.ensure_provisioned(&options.request())?;
        tracing::info!(
            version = %sentinel.compiler_version,
            path = %sentinel.tool_path.display(),
            "compiler provisioned"
        );
        Ok(sentinel)
    }
}
