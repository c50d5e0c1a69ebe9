//! AL compiler tool cache
//!
//! Layout under the cache root:
//!
//! ```text
//! <cache_root>/al/sentinel.json   what is provisioned
//! <cache_root>/al/current/        the one installed tree
//! ```
//!
//! The cache holds at most one version at a time. A run reads the sentinel, decides
//! between reuse and install, and writes the sentinel only after the installed
//! executable has been found on disk. Concurrent provisioning of the same cache root
//! is last-writer-wins; there is no file locking.

pub mod feed;
pub mod locate;
pub mod runtime;
pub mod sentinel;
pub mod version;

pub use feed::{DotnetToolInstaller, NugetFeed, PackageFeed, PackageInstaller};
pub use sentinel::{InstallationType, ProvisionRequest, ToolSentinel};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::diagnostics::{Emitter, Marker};
use crate::error::{AlbtError, Result};
use crate::progress::Spinner;
use sentinel::{Loaded, SENTINEL_FILE};
use version::Selection;

/// Directory name of the compiler below the cache root
pub const TOOL_NAME: &str = "al";

const CURRENT_DIR: &str = "current";
const PHASE: &str = "toolcache";

/// Validity of the cache for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    Invalid(String),
    Valid(ToolSentinel),
}

impl CacheState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Invalid(_) => "invalid",
            Self::Valid(_) => "valid",
        }
    }
}

/// Provisions the compiler into one cache root
pub struct ToolCache<'a> {
    cache_root: PathBuf,
    package_id: String,
    feed: &'a dyn PackageFeed,
    installer: &'a dyn PackageInstaller,
    emitter: &'a Emitter,
    global_tools_dir: Option<PathBuf>,
}

impl<'a> ToolCache<'a> {
    pub fn new(
        cache_root: PathBuf,
        package_id: Option<&str>,
        feed: &'a dyn PackageFeed,
        installer: &'a dyn PackageInstaller,
        emitter: &'a Emitter,
    ) -> Self {
        Self {
            cache_root,
            package_id: package_id.map_or_else(
                || locate::default_package_id().to_string(),
                str::to_string,
            ),
            feed,
            installer,
            emitter,
            global_tools_dir: locate::global_tools_dir(),
        }
    }

    /// Override where global .NET tools are looked up (`None` disables adoption)
    #[cfg(test)]
    pub fn with_global_tools_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.global_tools_dir = dir;
        self
    }

    pub fn tool_root(&self) -> PathBuf {
        self.cache_root.join(TOOL_NAME)
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.tool_root().join(SENTINEL_FILE)
    }

    pub fn current_dir(&self) -> PathBuf {
        self.tool_root().join(CURRENT_DIR)
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// Read-only view of the cache; a corrupt sentinel is reported as invalid
    pub fn inspect(&self, request: &ProvisionRequest) -> Result<(CacheState, Option<ToolSentinel>)> {
        Ok(match sentinel::load(&self.sentinel_path())? {
            Loaded::Missing => (CacheState::Missing, None),
            Loaded::Corrupt(reason) => (CacheState::Invalid(format!("corrupt sentinel: {reason}")), None),
            Loaded::Present(s) => match s.validate(request) {
                Ok(()) => (CacheState::Valid(s.clone()), Some(s)),
                Err(reason) => (CacheState::Invalid(reason), Some(s)),
            },
        })
    }

    /// Cache state for a provisioning run; corrupt sentinels are moved aside
    fn prepare(&self, request: &ProvisionRequest) -> Result<CacheState> {
        let path = self.sentinel_path();
        match sentinel::load(&path)? {
            Loaded::Missing => Ok(CacheState::Missing),
            Loaded::Corrupt(reason) => {
                let backup = sentinel::backup_corrupt(&path)?;
                tracing::warn!(
                    %reason,
                    backup = %backup.display(),
                    "corrupt sentinel moved aside"
                );
                Ok(CacheState::Missing)
            }
            Loaded::Present(s) => Ok(match s.validate(request) {
                Ok(()) => CacheState::Valid(s),
                Err(reason) => CacheState::Invalid(reason),
            }),
        }
    }

    /// Make sure the requested compiler is installed and recorded
    ///
    /// # Errors
    ///
    /// `VersionNotFound` when no compatible version is published (nothing is installed),
    /// `InstallationFailure` when the installer fails or the executable cannot be found
    /// afterwards (no sentinel is written).
    pub fn ensure_provisioned(&self, request: &ProvisionRequest) -> Result<ToolSentinel> {
        let state = self.prepare(request)?;
        let mut marker = Marker::phase(PHASE).field("state", state.name());
        if let CacheState::Invalid(reason) = &state {
            marker = marker.field("reason", reason);
        }
        self.emitter.emit(&marker);

        if let CacheState::Valid(sentinel) = state {
            self.emit_action("reuse", &sentinel.compiler_version);
            return Ok(sentinel);
        }

        let selection = self.select(request)?;
        let version = selection.version();
        tracing::info!(?selection, "compiler version selected");

        if let Some(adopted) = self.adopt_global(version, request)? {
            self.emit_action("adopt", version);
            return Ok(adopted);
        }

        self.emit_action("install", version);
        let tool_path = self.install(version)?;
        let sentinel = ToolSentinel::new(
            version,
            request.runtime.as_deref(),
            tool_path,
            &self.package_id,
            InstallationType::LocalTool,
        );
        sentinel.write_atomic(&self.sentinel_path())?;
        Ok(sentinel)
    }

    fn emit_action(&self, action: &str, version: &str) {
        self.emitter.emit(
            &Marker::phase(PHASE)
                .field("action", action)
                .field("version", version),
        );
    }

    fn select(&self, request: &ProvisionRequest) -> Result<Selection> {
        if let Some(explicit) = &request.version {
            return Ok(Selection::Explicit(explicit.clone()));
        }
        let available = self.feed.versions(&self.package_id)?;
        tracing::debug!(count = available.len(), package = %self.package_id, "versions listed");
        version::select_for(&self.package_id, &available, request.runtime.as_deref())
    }

    fn adopt_global(&self, version: &str, request: &ProvisionRequest) -> Result<Option<ToolSentinel>> {
        let Some(tools_dir) = &self.global_tools_dir else {
            return Ok(None);
        };
        let Some(exe) = locate::find_global_tool(tools_dir, &self.package_id, version) else {
            return Ok(None);
        };
        tracing::info!(path = %exe.display(), "adopting global tool");

        remove_dir_if_exists(&self.current_dir())?;
        let sentinel = ToolSentinel::new(
            version,
            request.runtime.as_deref(),
            exe,
            &self.package_id,
            InstallationType::MigratedGlobal,
        );
        sentinel.write_atomic(&self.sentinel_path())?;
        Ok(Some(sentinel))
    }

    /// Install into a staging directory, then swap it into `current`
    fn install(&self, version: &str) -> Result<PathBuf> {
        let tool_root = self.tool_root();
        std::fs::create_dir_all(&tool_root)
            .map_err(|e| crate::error::fs::write_failed(&tool_root, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&tool_root)
            .map_err(|e| crate::error::fs::write_failed(&tool_root, e))?;

        let spinner = Spinner::new(format!("Installing {} {version}", self.package_id));
        if let Err(e) = self
            .installer
            .install(&self.package_id, version, staging.path())
        {
            spinner.abandon();
            return Err(e);
        }

        let Some(exe) = locate::find_executable(staging.path()) else {
            spinner.abandon();
            return Err(AlbtError::InstallationFailure {
                package: self.package_id.clone(),
                reason: format!("no compiler executable found after installing {version}"),
            });
        };
        let relative = exe
            .strip_prefix(staging.path())
            .map_err(|e| AlbtError::IoError {
                message: e.to_string(),
            })?
            .to_path_buf();

        self.swap_into_current(staging.path())?;
        spinner.finish();
        Ok(self.current_dir().join(relative))
    }

    fn swap_into_current(&self, staged: &Path) -> Result<()> {
        swap_dirs(staged, &self.current_dir(), &self.tool_root(), |from, to| {
            std::fs::rename(from, to)
        })
    }

    /// Remove the sentinel and installed tree; returns whether anything existed
    pub fn clear(&self) -> Result<bool> {
        let root = self.tool_root();
        let existed = root.exists();
        remove_dir_if_exists(&root)?;
        Ok(existed)
    }
}

/// Move `staged` to `current`, restoring the previous tree if the move fails
///
/// The previous tree is parked under a `.retired-*` directory in `tool_root` and deleted
/// once the new tree is in place. If it cannot be restored it is kept there and the
/// error names its location.
fn swap_dirs<F>(staged: &Path, current: &Path, tool_root: &Path, rename: F) -> Result<()>
where
    F: Fn(&Path, &Path) -> std::io::Result<()>,
{
    let retired = tempfile::Builder::new()
        .prefix(".retired-")
        .tempdir_in(tool_root)
        .map_err(|e| crate::error::fs::write_failed(current, e))?;
    let previous = retired.path().join(CURRENT_DIR);

    let had_previous = current.exists();
    if had_previous {
        rename(current, &previous).map_err(|e| crate::error::fs::write_failed(current, e))?;
    }
    let Err(swap_err) = rename(staged, current) else {
        // dropping `retired` deletes the previous tree
        return Ok(());
    };
    if had_previous {
        if let Err(restore_err) = rename(&previous, current) {
            let kept = retired.keep().join(CURRENT_DIR);
            tracing::error!(
                current = %current.display(),
                kept = %kept.display(),
                error = %restore_err,
                "failed to restore previous compiler tree"
            );
            return Err(crate::error::fs::restore_failed(current, &swap_err, &kept, &restore_err));
        }
    }
    Err(crate::error::fs::write_failed(current, swap_err))
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(crate::error::fs::write_failed(path, e)),
    }
}
