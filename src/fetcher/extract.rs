//! Archive extraction and payload lookup

use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use walkdir::WalkDir;

use crate::error::{AlbtError, Result, fetch};

/// Maximum depth of the fallback search for the payload directory
pub const SUBDIR_SEARCH_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from magic bytes
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [0x1f, 0x8b, ..] => Some(Self::TarGz),
            [b'P', b'K', 0x03, 0x04, ..] | [b'P', b'K', 0x05, 0x06, ..] => Some(Self::Zip),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extract `data` into `dest`, returning the number of files written
///
/// Only regular files and directories are extracted. Entries whose path would land
/// outside `dest` fail the whole extraction with `CorruptArchive`.
pub fn extract(data: &[u8], format: ArchiveFormat, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).map_err(|e| crate::error::fs::write_failed(dest, e))?;
    match format {
        ArchiveFormat::TarGz => extract_tar_gz(data, dest),
        ArchiveFormat::Zip => extract_zip(data, dest),
    }
}

fn extract_tar_gz(data: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));
    let entries = archive
        .entries()
        .map_err(|e| fetch::corrupt_archive(format!("failed to read tar: {e}")))?;

    let mut files = 0;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| fetch::corrupt_archive(format!("failed to read tar entry: {e}")))?;
        let kind = entry.header().entry_type();
        if !matches!(
            kind,
            EntryType::Regular | EntryType::Continuous | EntryType::Directory
        ) {
            // pax headers, links and devices
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| fetch::corrupt_archive(format!("invalid path in tar: {e}")))?
            .into_owned();
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| fetch::corrupt_archive(format!("failed to extract {}: {e}", path.display())))?;
        if !unpacked {
            return Err(fetch::corrupt_archive(format!(
                "entry escapes the extraction root: {}",
                path.display()
            )));
        }
        if kind != EntryType::Directory {
            files += 1;
        }
    }
    Ok(files)
}

fn extract_zip(data: &[u8], dest: &Path) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| fetch::corrupt_archive(format!("failed to open zip: {e}")))?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| fetch::corrupt_archive(format!("failed to read zip entry: {e}")))?;

        let Some(relative) = file.enclosed_name() else {
            return Err(fetch::corrupt_archive(format!(
                "entry escapes the extraction root: {}",
                file.name()
            )));
        };
        let outpath = dest.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| crate::error::fs::write_failed(&outpath, e))?;
            continue;
        }
        if file.is_symlink() {
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| crate::error::fs::write_failed(parent, e))?;
        }
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| fetch::corrupt_archive(format!("failed to inflate {}: {e}", file.name())))?;
        fs::write(&outpath, &content).map_err(|e| crate::error::fs::write_failed(&outpath, e))?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(mode & 0o777);
            fs::set_permissions(&outpath, perms)
                .map_err(|e| crate::error::fs::write_failed(&outpath, e))?;
        }
        files += 1;
    }
    Ok(files)
}

/// Find the payload directory `subdir` inside an extraction root
///
/// Looks directly under the root and under its single top-level folder first, then
/// searches up to [`SUBDIR_SEARCH_DEPTH`] levels deep, preferring the shallowest match.
pub fn locate_subdir(root: &Path, subdir: &str) -> Result<PathBuf> {
    let mut direct = vec![root.join(subdir)];
    if let Some(top) = single_top_level_dir(root) {
        direct.insert(0, top.join(subdir));
    }
    if let Some(found) = direct.into_iter().find(|p| is_non_empty_dir(p)) {
        return Ok(found);
    }

    let wanted = Path::new(subdir);
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(SUBDIR_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir() && e.path().ends_with(wanted))
        .filter(|e| is_non_empty_dir(e.path()))
        .min_by_key(walkdir::DirEntry::depth)
        .map(walkdir::DirEntry::into_path)
        .ok_or_else(|| {
            fetch::corrupt_archive(format!(
                "archive does not contain a non-empty '{subdir}' directory"
            ))
        })
}

fn single_top_level_dir(root: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(root).ok()?.filter_map(std::result::Result::ok);
    let first = entries.next()?;
    if entries.next().is_some() || !first.path().is_dir() {
        return None;
    }
    Some(first.path())
}

fn is_non_empty_dir(path: &Path) -> bool {
    path.is_dir()
        && fs::read_dir(path)
            .map(|mut d| d.next().is_some())
            .unwrap_or(false)
}

/// Number of regular files below `dir`
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}

/// Map non-archive bytes to a `CorruptArchive` error
pub fn detect_or_corrupt(data: &[u8], url: &str) -> Result<ArchiveFormat> {
    ArchiveFormat::detect(data).ok_or_else(|| AlbtError::CorruptArchive {
        reason: format!("{url} is neither a gzip tarball nor a zip archive"),
    })
}
