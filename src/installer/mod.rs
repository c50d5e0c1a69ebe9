//! Overlay installation into the destination repository
//!
//! The install is copy-only: every payload file is written to the same relative path
//! under the destination, overwriting what is there. Nothing in the destination is ever
//! deleted. There is no rollback; a copy that fails halfway leaves the working tree
//! partially updated, which `git status` / `git checkout` recover from.

pub mod commit;

use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::diagnostics::{Emitter, Marker};
use crate::error::{AlbtError, Result};
use crate::fetcher::ArchivePayload;
use crate::hash;

/// Outcome of an overlay copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallResult {
    pub files_copied: usize,
    /// Destination-relative paths written, in copy order
    pub files: Vec<PathBuf>,
    pub duration: Duration,
}

fn write_error(path: &Path, e: &std::io::Error) -> AlbtError {
    AlbtError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn is_git_metadata(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(n) if n == ".git"))
}

/// Copy the tree under `source` onto `destination`
///
/// Directory structure is preserved, dot-folders included. Symlinks and `.git`
/// metadata in the payload are skipped.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<InstallResult> {
    let started = Instant::now();
    std::fs::create_dir_all(destination).map_err(|e| write_error(destination, &e))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| AlbtError::FileReadFailed {
            path: source.display().to_string(),
            reason: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| AlbtError::IoError {
                message: e.to_string(),
            })?;
        if is_git_metadata(relative) {
            continue;
        }

        let target = destination.join(relative);
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            tracing::debug!(path = %relative.display(), "skipping symlink in payload");
        } else if file_type.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| write_error(&target, &e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| write_error(parent, &e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| write_error(&target, &e))?;
            files.push(relative.to_path_buf());
        }
    }

    Ok(InstallResult {
        files_copied: files.len(),
        files,
        duration: started.elapsed(),
    })
}

/// Copies payloads and reports the result
pub struct Installer<'a> {
    emitter: &'a Emitter,
}

impl<'a> Installer<'a> {
    pub fn new(emitter: &'a Emitter) -> Self {
        Self { emitter }
    }

    /// Install `payload` into `destination` and emit the `success` marker
    pub fn install(
        &self,
        payload: &ArchivePayload,
        destination: &Path,
        reference: &str,
    ) -> Result<InstallResult> {
        tracing::debug!(
            files = payload.file_count,
            source = %payload.source_dir.display(),
            "copying overlay"
        );
        let digest = hash::hash_directory(&payload.source_dir)?;
        let result = copy_tree(&payload.source_dir, destination)?;
        tracing::info!(
            files = result.files_copied,
            overlay = %digest,
            destination = %destination.display(),
            "overlay copied"
        );
        self.emitter.emit(&Marker::success(
            reference,
            &payload.source_subdir,
            result.duration.as_secs_f64(),
        ));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn temp() -> TempDir {
        TempDir::new_in(crate::temp::temp_dir_base()).unwrap()
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copies_dot_folders() {
        let src = temp();
        let dst = temp();
        write(src.path(), ".github/workflows/ci.yml", "ci");
        write(src.path(), "scripts/make/build.ps1", "build");
        write(src.path(), "al.build.ps1", "tasks");

        let result = copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(result.files_copied, 3);
        assert_eq!(
            fs::read_to_string(dst.path().join(".github/workflows/ci.yml")).unwrap(),
            "ci"
        );
        assert!(dst.path().join("scripts/make/build.ps1").is_file());
    }

    #[test]
    fn test_overwrites_but_never_deletes() {
        let src = temp();
        let dst = temp();
        write(src.path(), "al.build.ps1", "new");
        write(dst.path(), "al.build.ps1", "old");
        write(dst.path(), "app/app.json", "{}");

        copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(
            fs::read_to_string(dst.path().join("al.build.ps1")).unwrap(),
            "new"
        );
        assert_eq!(fs::read_to_string(dst.path().join("app/app.json")).unwrap(), "{}");
    }

    #[test]
    fn test_copy_is_idempotent() {
        let src = temp();
        let dst = temp();
        write(src.path(), "a.txt", "a");
        write(src.path(), ".config/b.json", "b");

        copy_tree(src.path(), dst.path()).unwrap();
        let first = crate::hash::hash_directory(dst.path()).unwrap();
        copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(first, crate::hash::hash_directory(dst.path()).unwrap());
    }

    #[test]
    fn test_skips_git_metadata() {
        let src = temp();
        let dst = temp();
        write(src.path(), ".git/HEAD", "ref: refs/heads/x");
        write(src.path(), "a.txt", "a");
        let result = copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(result.files, vec![PathBuf::from("a.txt")]);
        assert!(!dst.path().join(".git").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_symlinks() {
        let src = temp();
        let dst = temp();
        write(src.path(), "real.txt", "r");
        std::os::unix::fs::symlink("/etc/passwd", src.path().join("link")).unwrap();
        let result = copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(result.files_copied, 1);
        assert!(!dst.path().join("link").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_is_io_category() {
        use std::os::unix::fs::PermissionsExt;
        let src = temp();
        let dst = temp();
        write(src.path(), "locked/a.txt", "a");
        fs::create_dir_all(dst.path().join("locked")).unwrap();
        fs::set_permissions(dst.path().join("locked"), fs::Permissions::from_mode(0o500)).unwrap();

        let result = copy_tree(src.path(), dst.path());
        fs::set_permissions(dst.path().join("locked"), fs::Permissions::from_mode(0o700)).unwrap();
        // root ignores permission bits
        if let Err(err) = result {
            assert_eq!(err.category(), crate::error::ErrorCategory::IoError);
        }
    }
}
