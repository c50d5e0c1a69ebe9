//! Install operation
//!
//! Phase order of one run:
//!
//! 1. repository guard (nothing else happens when it fails)
//! 2. prerequisites, when requested
//! 3. resolve the ref to an archive URL
//! 4. download and extract into a temp workspace
//! 5. copy the overlay into the destination (`success` marker)
//! 6. commit the copied files, when requested
//! 7. provision the compiler, when requested
//!
//! The temp workspace is owned by the fetched payload and removed before the commit
//! and provisioning phases run.

use std::path::{Path, PathBuf};

use git2::Oid;
use normpath::PathExt;

use super::{ProvisionOperation, ProvisionOptions, Services, retry_policy};
use crate::config::Config;
use crate::diagnostics::Marker;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::guard::{self, RepositoryState};
use crate::installer::{InstallResult, Installer, commit};
use crate::prereq::Provisioner;
use crate::resolver::{MetadataCache, ReleaseReference, Remote, Resolver};
use crate::toolcache::ToolSentinel;

/// What an install run should do beyond the overlay copy
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Destination directory inside a git working tree
    pub destination: PathBuf,
    pub require_clean: bool,
    pub prerequisites: bool,
    /// Install missing prerequisites without asking
    pub auto_install: bool,
    pub commit: bool,
    pub commit_message: Option<String>,
    pub provision: bool,
    pub runtime: Option<String>,
    pub compiler_version: Option<String>,
    /// Marker transcript, opened once the repository guard has passed
    pub transcript: Option<PathBuf>,
}

/// Outcome of a successful install run
#[derive(Debug)]
pub struct InstallSummary {
    pub repository: RepositoryState,
    pub reference: ReleaseReference,
    pub result: InstallResult,
    pub commit: Option<Oid>,
    pub sentinel: Option<ToolSentinel>,
}

pub struct InstallOperation<'a> {
    config: &'a Config,
    services: Services<'a>,
    options: InstallOptions,
}

impl<'a> InstallOperation<'a> {
    pub fn new(config: &'a Config, services: Services<'a>, options: InstallOptions) -> Self {
        Self {
            config,
            services,
            options,
        }
    }

    pub fn execute(&self) -> Result<InstallSummary> {
        let emitter = self.services.emitter;
        let destination = &self.options.destination;

        let repository = match guard::check_repository(destination, self.options.require_clean) {
            Ok(state) => state,
            Err(e) => {
                emitter.emit(&Marker::guard(e.category()).field("path", destination.display()));
                return Err(e);
            }
        };
        if let Some(path) = &self.options.transcript {
            emitter.attach_transcript(path)?;
        }
        emitter.emit(&Marker::step("repository").field("clean", repository.is_clean));

        if self.options.prerequisites {
            Provisioner::new(
                self.services.runner,
                self.services.prompt,
                emitter,
                !self.options.auto_install,
            )
            .ensure_all()?;
        }

        let reference = self.resolve()?;
        emitter.emit(
            &Marker::step("resolve")
                .field("ref", reference.label())
                .field("tag", &reference.resolved_tag)
                .field("kind", reference.kind)
                .field("url", &reference.asset_url)
                .field_opt("asset", reference.asset_id.as_deref()),
        );

        let payload = Fetcher::new(self.services.transport, retry_policy(self.config), emitter)
            .fetch(&reference, &self.config.source_subdir)?;
        let installed = Installer::new(emitter).install(&payload, destination, reference.label());
        if let Err(e) = payload.close() {
            tracing::warn!(error = %e, "failed to remove temp workspace");
        }
        let result = installed?;

        let commit = if self.options.commit {
            self.commit(&repository, &reference, &result)?
        } else {
            None
        };

        let sentinel = if self.options.provision {
            let options = ProvisionOptions {
                project_root: destination.clone(),
                runtime: self.options.runtime.clone(),
                compiler_version: self.options.compiler_version.clone(),
            };
            Some(ProvisionOperation::new(self.config, self.services).execute(&options)?)
        } else {
            None
        };

        Ok(InstallSummary {
            repository,
            reference,
            result,
            commit,
            sentinel,
        })
    }

    fn resolve(&self) -> Result<ReleaseReference> {
        let remote = Remote::parse(&self.config.remote_url)?;
        let mut cache = MetadataCache::new(self.config.metadata_ttl);
        Resolver::new(self.services.transport, remote, retry_policy(self.config))
            .resolve(self.config.source_ref.as_deref(), &mut cache)
    }

    fn commit(
        &self,
        repository: &RepositoryState,
        reference: &ReleaseReference,
        result: &InstallResult,
    ) -> Result<Option<Oid>> {
        let prefix = relative_to_root(&repository.path, &repository.root);
        let files: Vec<PathBuf> = result.files.iter().map(|f| prefix.join(f)).collect();
        let message = self
            .options
            .commit_message
            .clone()
            .unwrap_or_else(|| commit::default_message(&reference.resolved_tag));

        let oid = commit::commit_files(&repository.root, &files, &message)?;
        let marker = match oid {
            Some(oid) => Marker::step("commit")
                .field("status", "committed")
                .field("id", oid),
            None => Marker::step("commit").field("status", "skipped"),
        };
        self.services.emitter.emit(&marker);
        Ok(oid)
    }
}

/// `destination` relative to the working tree `root`; empty when it is the root
fn relative_to_root(destination: &Path, root: &Path) -> PathBuf {
    let destination = destination
        .normalize()
        .map(|p| p.into_path_buf())
        .unwrap_or_else(|_| destination.to_path_buf());
    destination
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
