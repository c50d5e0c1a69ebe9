//! Archive download and extraction
//!
//! Every fetch works inside a private, randomly named temp workspace that lives as long
//! as the returned [`ArchivePayload`]. Dropping the payload removes the workspace,
//! whichever way the run ends.

pub mod extract;

pub use extract::ArchiveFormat;

use std::path::{Path, PathBuf};

use crate::diagnostics::{Emitter, Marker};
use crate::error::{AlbtError, Result};
use crate::hash;
use crate::progress::Spinner;
use crate::resolver::ReleaseReference;
use crate::retry::{self, RetryPolicy};
use crate::temp::TempWorkspace;
use crate::transport::Transport;

/// Extracted archive ready to be installed
#[derive(Debug)]
pub struct ArchivePayload {
    /// Downloaded archive file inside the workspace
    pub local_path: PathBuf,
    /// Directory the archive was extracted into
    pub extracted_root: PathBuf,
    /// Absolute path of the payload directory
    pub source_dir: PathBuf,
    /// Payload directory name as requested (`overlay` by default)
    pub source_subdir: String,
    /// Regular files below `source_dir`
    pub file_count: usize,
    pub format: ArchiveFormat,
    pub digest: String,
    workspace: TempWorkspace,
}

impl ArchivePayload {
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Remove the workspace now, surfacing cleanup errors
    pub fn close(self) -> Result<()> {
        self.workspace.close()
    }
}

/// Downloads and unpacks resolved archives
pub struct Fetcher<'a> {
    transport: &'a dyn Transport,
    retry: RetryPolicy,
    emitter: &'a Emitter,
    temp_base: PathBuf,
}

impl<'a> Fetcher<'a> {
    pub fn new(transport: &'a dyn Transport, retry: RetryPolicy, emitter: &'a Emitter) -> Self {
        Self {
            transport,
            retry,
            emitter,
            temp_base: crate::temp::temp_dir_base(),
        }
    }

    /// Create workspaces under `base` instead of the system temp root
    #[cfg(test)]
    pub fn with_temp_base(mut self, base: PathBuf) -> Self {
        self.temp_base = base;
        self
    }

    /// Download `reference` and locate `subdir` in it
    ///
    /// The primary archive is tried first; when its download or extraction fails the
    /// zip fallback is tried. A `download failure` marker is emitted when both fail.
    pub fn fetch(&self, reference: &ReleaseReference, subdir: &str) -> Result<ArchivePayload> {
        let workspace = TempWorkspace::create_in(&self.temp_base)?;
        self.emitter.emit(&Marker::temp(workspace.path()));

        let urls: Vec<&str> = std::iter::once(reference.asset_url.as_str())
            .chain(reference.fallback_url.as_deref())
            .collect();

        let spinner = Spinner::new(format!("Downloading {}", reference.label()));
        let mut last_error = None;
        for (attempt, url) in urls.iter().enumerate() {
            match self.fetch_one(url, subdir, workspace.path(), attempt) {
                Ok(fetched) => {
                    spinner.finish();
                    self.emitter.emit(
                        &Marker::step("download")
                            .field("bytes", fetched.bytes)
                            .field("digest", &fetched.digest)
                            .field("format", fetched.format),
                    );
                    return Ok(ArchivePayload {
                        local_path: fetched.local_path,
                        extracted_root: fetched.extracted_root,
                        file_count: extract::count_files(&fetched.source_dir),
                        source_dir: fetched.source_dir,
                        source_subdir: subdir.to_string(),
                        format: fetched.format,
                        digest: fetched.digest,
                        workspace,
                    });
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "archive attempt failed");
                    // a missing fallback says nothing about why the primary failed
                    if last_error.is_none() || !matches!(e, AlbtError::NotFound { .. }) {
                        last_error = Some((*url, e));
                    }
                }
            }
        }
        spinner.abandon();

        let (url, err) = last_error.unwrap_or_else(|| {
            (
                reference.asset_url.as_str(),
                AlbtError::Unknown {
                    message: "no archive URL to download".to_string(),
                },
            )
        });
        if err.category().is_download() {
            self.emitter
                .emit(&Marker::download_failure(err.category(), url));
        }
        Err(err)
    }

    fn fetch_one(&self, url: &str, subdir: &str, workspace: &Path, attempt: usize) -> Result<Fetched> {
        let data = retry::with_retry(
            "archive download",
            &self.retry,
            || self.transport.get(url),
            retry::is_transient,
        )?;
        let format = extract::detect_or_corrupt(&data, url)?;

        let local_path = workspace.join(format!("archive-{attempt}.{}", format.extension()));
        std::fs::write(&local_path, &data)
            .map_err(|e| crate::error::fs::write_failed(&local_path, e))?;

        let extracted_root = workspace.join(format!("extract-{attempt}"));
        let files = extract::extract(&data, format, &extracted_root)?;
        tracing::debug!(%url, files, %format, "archive extracted");

        let source_dir = extract::locate_subdir(&extracted_root, subdir)?;
        Ok(Fetched {
            local_path,
            extracted_root,
            source_dir,
            format,
            bytes: data.len(),
            digest: hash::hash_bytes(&data),
        })
    }
}

struct Fetched {
    local_path: PathBuf,
    extracted_root: PathBuf,
    source_dir: PathBuf,
    format: ArchiveFormat,
    bytes: usize,
    digest: String,
}

#[cfg(test)]
mod tests {
    use super::extract::tests::{tar_gz, zip};
    use super::*;
    use crate::error::ErrorCategory;
    use crate::resolver::RefKind;
    use crate::transport::testing::{FailWith, MockTransport};
    use std::time::Duration;

    const PRIMARY: &str = "https://github.com/o/r/archive/refs/heads/main.tar.gz";
    const SECONDARY: &str = "https://github.com/o/r/archive/refs/heads/main.zip";

    fn reference() -> ReleaseReference {
        ReleaseReference {
            reference: Some("main".to_string()),
            resolved_tag: "main".to_string(),
            asset_url: PRIMARY.to_string(),
            asset_id: None,
            fallback_url: Some(SECONDARY.to_string()),
            kind: RefKind::Branch,
        }
    }

    fn quick() -> RetryPolicy {
        RetryPolicy::once_after(Duration::ZERO)
    }

    #[test]
    fn test_fetch_tar_gz() {
        let transport = MockTransport::new().with(
            PRIMARY,
            tar_gz(&[("r-main/overlay/foo.txt", "foo"), ("r-main/README.md", "r")]),
        );
        let (emitter, buffer) = Emitter::buffered();
        let payload = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference(), "overlay")
            .unwrap();

        assert_eq!(payload.file_count, 1);
        assert_eq!(payload.format, ArchiveFormat::TarGz);
        assert!(payload.source_dir.join("foo.txt").is_file());

        let markers = buffer.markers();
        assert_eq!(markers[0].kind, "temp");
        assert_eq!(
            markers[0].get("workspace"),
            Some(payload.workspace().display().to_string().as_str())
        );
        assert_eq!(markers[1].get("name"), Some("download"));
        assert_eq!(markers[1].get("format"), Some("tar.gz"));
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let transport =
            MockTransport::new().with(PRIMARY, tar_gz(&[("r-main/overlay/foo.txt", "foo")]));
        let (emitter, _buffer) = Emitter::buffered();
        let payload = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference(), "overlay")
            .unwrap();
        let workspace = payload.workspace().to_path_buf();
        assert!(workspace.starts_with(dunce::canonicalize(crate::temp::temp_dir_base()).unwrap()));
        drop(payload);
        assert!(!workspace.exists());
    }

    #[test]
    fn test_falls_back_to_zip() {
        let transport = MockTransport::new()
            .with(PRIMARY, b"not an archive".to_vec())
            .with(SECONDARY, zip(&[("r-main/overlay/foo.txt", "foo")]));
        let (emitter, buffer) = Emitter::buffered();
        let payload = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference(), "overlay")
            .unwrap();
        assert_eq!(payload.format, ArchiveFormat::Zip);
        assert!(
            buffer
                .markers()
                .iter()
                .all(|m| !m.has_label("failure"))
        );
    }

    #[test]
    fn test_download_retried_once_then_failure_marker() {
        let base = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let transport = MockTransport::new().failing(PRIMARY, FailWith::Network);
        let mut reference = reference();
        reference.fallback_url = None;
        let (emitter, buffer) = Emitter::buffered();
        let err = Fetcher::new(&transport, quick(), &emitter)
            .with_temp_base(base.path().to_path_buf())
            .fetch(&reference, "overlay")
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::NetworkUnavailable);
        assert_eq!(transport.request_count(), 2);

        let failure = buffer
            .markers()
            .into_iter()
            .find(|m| m.kind == "download")
            .unwrap();
        assert!(failure.has_label("failure"));
        assert_eq!(failure.get("category"), Some("NetworkUnavailable"));
        assert_eq!(failure.get("url"), Some(PRIMARY));

        // workspace cleaned up on failure
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_overlay_is_corrupt() {
        let transport = MockTransport::new()
            .with(PRIMARY, tar_gz(&[("r-main/docs/readme.md", "r")]))
            .with(SECONDARY, zip(&[("r-main/docs/readme.md", "r")]));
        let (emitter, buffer) = Emitter::buffered();
        let err = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference(), "overlay")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CorruptArchive);
        let failure = buffer.markers().into_iter().last().unwrap();
        assert_eq!(failure.get("url"), Some(SECONDARY));
    }

    #[test]
    fn test_missing_fallback_keeps_primary_error() {
        let transport = MockTransport::new().with(PRIMARY, b"not an archive".to_vec());
        let (emitter, buffer) = Emitter::buffered();
        let err = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference(), "overlay")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CorruptArchive);
        let failure = buffer.markers().into_iter().last().unwrap();
        assert_eq!(failure.get("url"), Some(PRIMARY));
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let transport = MockTransport::new();
        let mut reference = reference();
        reference.fallback_url = None;
        let (emitter, _buffer) = Emitter::buffered();
        let err = Fetcher::new(&transport, quick(), &emitter)
            .fetch(&reference, "overlay")
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(transport.request_count(), 1);
    }
}
