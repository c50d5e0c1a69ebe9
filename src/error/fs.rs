//! File system errors

use std::path::Path;

use super::AlbtError;

/// Creates a read failure for `path`
pub fn read_failed(path: &Path, err: impl std::fmt::Display) -> AlbtError {
    AlbtError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a write failure for `path`
pub fn write_failed(path: &Path, err: impl std::fmt::Display) -> AlbtError {
    AlbtError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates the error for a replace whose rollback also failed
///
/// `kept` is where the previous content was left behind.
pub fn restore_failed(
    path: &Path,
    err: impl std::fmt::Display,
    kept: &Path,
    restore_err: impl std::fmt::Display,
) -> AlbtError {
    io_error(format!(
        "Failed to replace {}: {err}; restoring the previous content also failed: {restore_err}; it was kept at {}",
        path.display(),
        kept.display()
    ))
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> AlbtError {
    AlbtError::IoError {
        message: message.into(),
    }
}
