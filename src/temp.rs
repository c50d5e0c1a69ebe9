//! Safe temporary directory base so temp dirs are never created under the current working
//! directory (e.g. when TMPDIR=tmp or TMPDIR=./tmp).

use std::env;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{AlbtError, Result};

/// Prefix of per-run install workspaces
pub const WORKSPACE_PREFIX: &str = "albt-install-";

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path, so temp dirs are never created under the current working
/// directory (avoids repo/tmp when TMPDIR=tmp and cwd is the repo).
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// A private, randomly named directory under the system temp root.
///
/// The directory is removed when the value is dropped, on success, error, or unwind.
#[derive(Debug)]
pub struct TempWorkspace {
    dir: TempDir,
    path: PathBuf,
}

impl TempWorkspace {
    pub fn create() -> Result<Self> {
        Self::create_in(&temp_dir_base())
    }

    pub fn create_in(base: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(base)
            .map_err(|e| AlbtError::IoError {
                message: format!("Failed to create temp workspace in {}: {e}", base.display()),
            })?;
        // dunce strips the \\?\ prefix on Windows so the reported path stays readable
        let path = dunce::canonicalize(dir.path()).unwrap_or_else(|_| dir.path().to_path_buf());
        Ok(Self { dir, path })
    }

    /// Absolute path of the workspace
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<()> {
        self.dir.close().map_err(|e| AlbtError::IoError {
            message: format!("Failed to remove temp workspace: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_base_is_absolute() {
        assert!(temp_dir_base().is_absolute());
    }

    #[test]
    fn test_workspace_is_under_temp_root() {
        let ws = TempWorkspace::create().unwrap();
        let root = dunce::canonicalize(temp_dir_base()).unwrap();
        assert!(ws.path().is_absolute());
        assert!(ws.path().starts_with(&root));
        assert!(
            ws.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(WORKSPACE_PREFIX))
        );
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let ws = TempWorkspace::create().unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(path.join("file.txt"), "x").unwrap();
        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn test_workspaces_are_distinct() {
        let a = TempWorkspace::create().unwrap();
        let b = TempWorkspace::create().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_close_removes_directory() {
        let ws = TempWorkspace::create().unwrap();
        let path = ws.path().to_path_buf();
        ws.close().unwrap();
        assert!(!path.exists());
    }
}
