//! Preconditions checked before any side effect
//!
//! The repository guard is always the first check of an install run: nothing touches
//! the network or the filesystem until it passes.

pub mod orchestrator;

pub use orchestrator::{InvocationContext, OrchestratorToken};

use std::path::{Path, PathBuf};

use git2::{Repository, StatusOptions};
use normpath::PathExt;

use crate::error::{AlbtError, Result};

/// Snapshot of the destination repository, re-derived every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    /// Path the state was derived from
    pub path: PathBuf,
    /// Working tree root discovered from `path`
    pub root: PathBuf,
    pub is_git_repo: bool,
    /// No modified, staged or untracked files (ignored files do not count)
    pub is_clean: bool,
}

/// Inspect `path` without failing; a missing directory is not a repository
pub fn inspect(path: &Path) -> RepositoryState {
    let not_a_repo = || RepositoryState {
        path: path.to_path_buf(),
        root: path.to_path_buf(),
        is_git_repo: false,
        is_clean: false,
    };

    if !path.is_dir() {
        return not_a_repo();
    }
    let Ok(repo) = Repository::discover(path) else {
        return not_a_repo();
    };
    let Some(workdir) = repo.workdir() else {
        // bare repositories have nothing to install into
        return not_a_repo();
    };

    let root = workdir
        .normalize()
        .map(|np| np.into_path_buf())
        .unwrap_or_else(|_| workdir.to_path_buf());

    RepositoryState {
        path: path.to_path_buf(),
        root,
        is_git_repo: true,
        is_clean: is_clean(&repo),
    }
}

fn is_clean(repo: &Repository) -> bool {
    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false);
    match repo.statuses(Some(&mut options)) {
        Ok(statuses) => statuses.is_empty(),
        Err(e) => {
            tracing::debug!(error = %e, "could not read git status, treating tree as dirty");
            false
        }
    }
}

/// Require `path` to be inside a git working tree
///
/// # Errors
///
/// `GitRepoRequired` when no repository is discoverable from `path`, and
/// `DirtyWorkingTree` when `require_clean` is set and the tree has changes.
pub fn check_repository(path: &Path, require_clean: bool) -> Result<RepositoryState> {
    let state = inspect(path);
    tracing::debug!(
        path = %path.display(),
        is_git_repo = state.is_git_repo,
        is_clean = state.is_clean,
        "repository inspected"
    );

    if !state.is_git_repo {
        return Err(AlbtError::GitRepoRequired {
            path: path.display().to_string(),
        });
    }
    if require_clean && !state.is_clean {
        return Err(AlbtError::DirtyWorkingTree {
            path: path.display().to_string(),
        });
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp() -> TempDir {
        TempDir::new_in(crate::temp::temp_dir_base()).unwrap()
    }

    #[test]
    fn test_plain_directory_is_rejected() {
        let dir = temp();
        let err = check_repository(dir.path(), false).unwrap_err();
        assert!(matches!(err, AlbtError::GitRepoRequired { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_directory_is_not_created() {
        let dir = temp();
        let missing = dir.path().join("does-not-exist");
        assert!(check_repository(&missing, false).is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_repository_root_detected() {
        let dir = temp();
        Repository::init(dir.path()).unwrap();
        let state = check_repository(dir.path(), false).unwrap();
        assert!(state.is_git_repo);
        assert!(state.is_clean);
    }

    #[test]
    fn test_subdirectory_discovers_ancestor() {
        let dir = temp();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("src").join("app");
        std::fs::create_dir_all(&nested).unwrap();
        let state = check_repository(&nested, false).unwrap();
        assert!(state.is_git_repo);
    }

    #[test]
    fn test_untracked_file_makes_tree_dirty() {
        let dir = temp();
        Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("new.txt"), "x").unwrap();
        let state = inspect(dir.path());
        assert!(!state.is_clean);

        let err = check_repository(dir.path(), true).unwrap_err();
        assert!(matches!(err, AlbtError::DirtyWorkingTree { .. }));
    }

    #[test]
    fn test_ignored_file_keeps_tree_clean() {
        let dir = temp();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join(".gitignore"), "*.log\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(".gitignore")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("t", "t@example.test").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();

        std::fs::write(dir.path().join("build.log"), "x").unwrap();
        assert!(inspect(dir.path()).is_clean);
    }
}
