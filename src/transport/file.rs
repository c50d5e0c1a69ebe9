//! `file://` transport

use std::io::ErrorKind;
use std::path::PathBuf;

use super::Transport;
use crate::error::{AlbtError, Result, fetch};

/// Serves `file://` URLs from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTransport;

/// Convert a `file://` URL into a local path
///
/// Accepts both `file:///abs/path` and `file://C:/path` forms.
pub fn file_url_to_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("file://")?;
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    let bytes = rest.as_bytes();
    // file:///C:/x
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':'
    {
        return Some(PathBuf::from(&rest[1..]));
    }
    Some(PathBuf::from(rest))
}

impl Transport for FileTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let path = file_url_to_path(url).ok_or_else(|| fetch::not_found(url))?;
        if path.is_dir() {
            return Err(fetch::not_found(url));
        }
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => fetch::not_found(url),
            _ => AlbtError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })
    }

    fn probe(&self, url: &str) -> Result<()> {
        match file_url_to_path(url) {
            Some(path) if path.is_file() => Ok(()),
            _ => Err(fetch::not_found(url)),
        }
    }
}
