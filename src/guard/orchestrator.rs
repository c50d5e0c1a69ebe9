//! Orchestrator capability
//!
//! Some commands may only run when started by the task orchestrator. Instead of
//! checking an environment variable at the point of use, the entrypoint receives an
//! [`InvocationContext`] that either carries an [`OrchestratorToken`] or does not.

use crate::config::Config;
use crate::error::{AlbtError, Result};

/// Proof that the current invocation was started by the task orchestrator
///
/// Cannot be constructed outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorToken {
    _private: (),
}

/// Capabilities of the current invocation, "not authorized" by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationContext {
    token: Option<OrchestratorToken>,
}

impl InvocationContext {
    /// Context for a process the orchestrator marked as its child
    pub fn from_config(config: &Config) -> Self {
        if config.via_orchestrator {
            Self::orchestrated()
        } else {
            Self::default()
        }
    }

    /// Context minted in-process by the task bridge
    pub fn orchestrated() -> Self {
        Self {
            token: Some(OrchestratorToken { _private: () }),
        }
    }

    /// Fail with `OrchestratorRequired` unless a token is present
    pub fn require_orchestrator(&self, command: &str) -> Result<OrchestratorToken> {
        self.token.ok_or_else(|| AlbtError::OrchestratorRequired {
            command: command.to_string(),
        })
    }
}
