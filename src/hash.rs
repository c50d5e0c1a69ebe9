//! BLAKE3 digests for downloaded archives and overlay trees

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::{AlbtError, Result};

/// Hash prefix for BLAKE3 hashes
pub const HASH_PREFIX: &str = "blake3:";

/// Digest of an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> String {
    format!("{}{}", HASH_PREFIX, blake3::hash(data).to_hex())
}

fn update_from_file(hasher: &mut Hasher, path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| AlbtError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| AlbtError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }
    Ok(())
}

/// Digest of a directory tree
///
/// Files are hashed in sorted relative-path order together with their paths, so the
/// result only depends on names and contents. Symlinks and `.git` are ignored.
pub fn hash_directory(path: &Path) -> Result<String> {
    if !path.is_dir() {
        return Err(AlbtError::FileReadFailed {
            path: path.display().to_string(),
            reason: "not a directory".to_string(),
        });
    }

    let mut hasher = Hasher::new();
    let mut files: Vec<_> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .collect();

    files.sort_by(|a, b| a.path().cmp(b.path()));

    for entry in files {
        let relative = entry
            .path()
            .strip_prefix(path)
            .unwrap_or_else(|_| entry.path());
        // forward slashes keep digests stable across platforms
        let name = relative.to_string_lossy().replace('\\', "/");
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        update_from_file(&mut hasher, entry.path())?;
    }

    Ok(format!("{}{}", HASH_PREFIX, hasher.finalize().to_hex()))
}
