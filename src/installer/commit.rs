//! Optional commit of installed overlay files

use std::path::{Path, PathBuf};

use git2::{Index, Oid, Repository, Signature};

use crate::error::Result;

/// Default commit message for `tag`
pub fn default_message(tag: &str) -> String {
    format!("chore: install AL build tools overlay {tag}")
}

fn signature(repo: &Repository) -> Result<Signature<'static>> {
    match repo.signature() {
        Ok(sig) => Ok(sig.to_owned()),
        Err(e) => {
            tracing::debug!(error = %e, "no git identity configured, using fallback signature");
            Ok(Signature::now("albt", "albt@localhost")?)
        }
    }
}

/// Commit `files` (paths relative to `root`) on top of HEAD
///
/// The commit tree is HEAD's tree plus `files`, so anything else the user has staged
/// stays staged and out of the commit. Returns `None` without committing when the tree
/// would not change.
pub fn commit_files(root: &Path, files: &[PathBuf], message: &str) -> Result<Option<Oid>> {
    let repo = Repository::open(root)?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };

    let mut tree_index = Index::new()?;
    if let Some(parent) = &parent {
        tree_index.read_tree(&parent.tree()?)?;
    }
    let mut index = repo.index()?;
    for file in files {
        index.add_path(file)?;
        let entry = index
            .get_path(file, 0)
            .ok_or_else(|| git2::Error::from_str(&format!("{} was not staged", file.display())))?;
        tree_index.add(&entry)?;
    }
    index.write()?;
    let tree_id = tree_index.write_tree_to(&repo)?;

    if parent
        .as_ref()
        .is_some_and(|p| p.tree_id() == tree_id)
    {
        tracing::debug!("overlay already committed, nothing to do");
        return Ok(None);
    }

    let tree = repo.find_tree(tree_id)?;
    let sig = signature(&repo)?;
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    tracing::info!(commit = %oid, "overlay committed");
    Ok(Some(oid))
}
