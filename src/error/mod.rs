//! Error types and handling for albt
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostic codes and hints.
//!
//! Sub-modules group constructors by error domain:
//! - [`category`]: failure taxonomy and exit codes
//! - [`fetch`]: classification of transport failures
//! - [`fs`]: file system errors

pub mod category;
pub mod fetch;
pub mod fs;

pub use category::ErrorCategory;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for albt operations
#[derive(Error, Diagnostic, Debug)]
pub enum AlbtError {
    // Guard errors
    #[error("Not a git repository: {path}")]
    #[diagnostic(
        code(albt::guard::git_repo_required),
        help("The overlay is only installed into git working trees. Run 'git init' first.")
    )]
    GitRepoRequired { path: String },

    #[error("Working tree has uncommitted changes: {path}")]
    #[diagnostic(
        code(albt::guard::dirty_working_tree),
        help("Commit or stash your changes, or drop --require-clean")
    )]
    DirtyWorkingTree { path: String },

    #[error("Unknown parameter: {argument}")]
    #[diagnostic(
        code(albt::guard::unknown_parameter),
        help("Run 'albt --help' for the list of supported parameters")
    )]
    UnknownParameter { argument: String },

    #[error("'{command}' must be invoked through the task orchestrator")]
    #[diagnostic(
        code(albt::guard::orchestrator_required),
        help("Run it as 'albt run {command}' or through Invoke-Build")
    )]
    OrchestratorRequired { command: String },

    // Download errors
    #[error("Network unavailable while fetching {url}: {reason}")]
    #[diagnostic(
        code(albt::download::network_unavailable),
        help("Check your network connection and proxy settings")
    )]
    NetworkUnavailable { url: String, reason: String },

    #[error("Not found: {resource}")]
    #[diagnostic(
        code(albt::download::not_found),
        help("Check that the ref exists on the remote and the remote URL is correct")
    )]
    NotFound { resource: String },

    #[error("Timed out after {seconds}s while fetching {url}")]
    #[diagnostic(
        code(albt::download::timeout),
        help("Increase ALBT_HTTP_TIMEOUT_SECS or retry later")
    )]
    Timeout { url: String, seconds: u64 },

    #[error("Corrupt archive: {reason}")]
    #[diagnostic(
        code(albt::download::corrupt_archive),
        help("The downloaded archive is damaged or does not contain the overlay directory")
    )]
    CorruptArchive { reason: String },

    // Provisioning errors
    #[error("No published version of {package} matches {constraint}")]
    #[diagnostic(
        code(albt::toolcache::version_not_found),
        help("Pass --compiler-version explicitly or pick a runtime with a published compiler")
    )]
    VersionNotFound { package: String, constraint: String },

    #[error("Failed to install {package}: {reason}")]
    #[diagnostic(code(albt::toolcache::installation_failure))]
    InstallationFailure { package: String, reason: String },

    #[error("Required tool '{tool}' is not available: {reason}")]
    #[diagnostic(
        code(albt::prereq::missing_tool),
        help("Install it manually or re-run with --auto-install")
    )]
    MissingTool { tool: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(albt::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(albt::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(albt::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(
        code(albt::fs::write_failed),
        help("The destination may be partially updated; use 'git status' and 'git checkout' to recover")
    )]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(albt::fs::io_error))]
    IoError { message: String },

    // Git errors
    #[error("Git operation failed: {message}")]
    #[diagnostic(code(albt::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Unexpected error: {message}")]
    #[diagnostic(code(albt::unknown))]
    Unknown { message: String },
}

impl AlbtError {
    /// The single taxonomy category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GitRepoRequired { .. } => ErrorCategory::GitRepoRequired,
            Self::DirtyWorkingTree { .. } => ErrorCategory::DirtyWorkingTree,
            Self::UnknownParameter { .. } => ErrorCategory::UnknownParameter,
            Self::OrchestratorRequired { .. } => ErrorCategory::OrchestratorRequired,
            Self::NetworkUnavailable { .. } => ErrorCategory::NetworkUnavailable,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::CorruptArchive { .. } => ErrorCategory::CorruptArchive,
            Self::VersionNotFound { .. } => ErrorCategory::VersionNotFound,
            Self::InstallationFailure { .. } => ErrorCategory::InstallationFailure,
            Self::MissingTool { .. } => ErrorCategory::MissingTool,
            Self::ConfigInvalid { .. } | Self::ConfigParseFailed { .. } => {
                ErrorCategory::InvalidConfiguration
            }
            Self::FileReadFailed { .. }
            | Self::FileWriteFailed { .. }
            | Self::IoError { .. }
            | Self::GitOperationFailed { .. } => ErrorCategory::IoError,
            Self::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    /// Human hint for the stderr category line, if the variant carries one
    pub fn hint(&self) -> Option<String> {
        self.help().map(|h| h.to_string())
    }
}

impl From<std::io::Error> for AlbtError {
    fn from(err: std::io::Error) -> Self {
        AlbtError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for AlbtError {
    fn from(err: serde_yaml::Error) -> Self {
        AlbtError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for AlbtError {
    fn from(err: git2::Error) -> Self {
        AlbtError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl From<inquire::InquireError> for AlbtError {
    fn from(err: inquire::InquireError) -> Self {
        AlbtError::IoError {
            message: format!("Failed to read confirmation: {err}"),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, AlbtError>;
