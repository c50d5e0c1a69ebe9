//! Failure taxonomy and exit codes
//!
//! Every [`AlbtError`](super::AlbtError) maps to exactly one [`ErrorCategory`],
//! and every category maps to exactly one process exit code.

use std::fmt;

/// Exit code for a successful run
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general or unexpected errors
pub const EXIT_GENERAL: i32 = 1;

/// Exit code for guard violations (not a git repo, direct invocation, bad parameters)
pub const EXIT_GUARD: i32 = 2;

/// Reserved for the CI layer: static-analysis failure
#[allow(dead_code)]
pub const EXIT_STATIC_ANALYSIS: i32 = 3;

/// Reserved for the CI layer: contract-test failure
#[allow(dead_code)]
pub const EXIT_CONTRACT_TEST: i32 = 4;

/// Reserved for the CI layer: integration-test failure
#[allow(dead_code)]
pub const EXIT_INTEGRATION_TEST: i32 = 5;

/// Exit code for a required tool that is missing and was not installed
pub const EXIT_MISSING_TOOL: i32 = 6;

/// Category of a failure, printed verbatim in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    GitRepoRequired,
    DirtyWorkingTree,
    UnknownParameter,
    OrchestratorRequired,
    NetworkUnavailable,
    NotFound,
    Timeout,
    CorruptArchive,
    VersionNotFound,
    InstallationFailure,
    MissingTool,
    InvalidConfiguration,
    IoError,
    Unknown,
}

impl ErrorCategory {
    /// Name used in diagnostic markers and the stderr category line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitRepoRequired => "GitRepoRequired",
            Self::DirtyWorkingTree => "DirtyWorkingTree",
            Self::UnknownParameter => "UnknownParameter",
            Self::OrchestratorRequired => "OrchestratorRequired",
            Self::NetworkUnavailable => "NetworkUnavailable",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::CorruptArchive => "CorruptArchive",
            Self::VersionNotFound => "VersionNotFound",
            Self::InstallationFailure => "InstallationFailure",
            Self::MissingTool => "MissingTool",
            Self::InvalidConfiguration => "InvalidConfiguration",
            Self::IoError => "IOError",
            Self::Unknown => "Unknown",
        }
    }

    /// Guard categories abort before any mutation and exit with code 2
    pub fn is_guard(self) -> bool {
        matches!(
            self,
            Self::GitRepoRequired
                | Self::DirtyWorkingTree
                | Self::UnknownParameter
                | Self::OrchestratorRequired
        )
    }

    /// Download categories are reported with a `download failure` marker
    pub fn is_download(self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable | Self::NotFound | Self::Timeout | Self::CorruptArchive
        )
    }

    /// Transient categories are eligible for the single retry-after-delay
    pub fn is_transient(self) -> bool {
        matches!(self, Self::NetworkUnavailable | Self::Timeout)
    }

    pub fn exit_code(self) -> i32 {
        if self.is_guard() {
            EXIT_GUARD
        } else if self == Self::MissingTool {
            EXIT_MISSING_TOOL
        } else {
            EXIT_GENERAL
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
