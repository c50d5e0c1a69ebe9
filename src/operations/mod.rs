//! High-level operations
//!
//! Operations coordinate the phase modules:
//! - [`InstallOperation`]: guard, prerequisites, resolve, fetch, install, commit, provision
//! - [`ProvisionOperation`]: compiler tool cache provisioning on its own
//!
//! Every external effect goes through the injected [`Services`], so operations run
//! unchanged against in-memory doubles in tests.

pub mod install;
pub mod provision;

pub use install::{InstallOperation, InstallOptions};
pub use provision::{ProvisionOperation, ProvisionOptions};

use crate::config::Config;
use crate::diagnostics::Emitter;
use crate::prereq::Prompt;
use crate::process::CommandRunner;
use crate::retry::RetryPolicy;
use crate::transport::Transport;

/// External collaborators shared by all operations
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub transport: &'a dyn Transport,
    pub runner: &'a dyn CommandRunner,
    pub prompt: &'a dyn Prompt,
    pub emitter: &'a Emitter,
}

/// Single retry after the configured delay
pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy::once_after(config.retry_delay)
}
