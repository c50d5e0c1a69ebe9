//! External process execution
//!
//! Probing tools, installing packages and running orchestrated tasks all go through
//! [`CommandRunner`], so tests can substitute scripted results.

use std::io::ErrorKind;
use std::process::{Command, Stdio};

use crate::error::{AlbtError, Result};

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last non-empty line of stderr, falling back to stdout
    pub fn summary(&self) -> String {
        [&self.stderr, &self.stdout]
            .iter()
            .find_map(|s| s.lines().rev().find(|l| !l.trim().is_empty()))
            .unwrap_or("no output")
            .trim()
            .to_string()
    }
}

/// Runs external programs
pub trait CommandRunner: Send + Sync {
    /// Run to completion capturing output
    ///
    /// Fails with `MissingTool` when `program` cannot be found.
    fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run with inherited stdio and extra environment for the child only
    fn status(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<i32>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

fn spawn_error(program: &str, err: &std::io::Error) -> AlbtError {
    if err.kind() == ErrorKind::NotFound {
        AlbtError::MissingTool {
            tool: program.to_string(),
            reason: "not found on PATH".to_string(),
        }
    } else {
        AlbtError::IoError {
            message: format!("Failed to start {program}: {err}"),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        tracing::debug!(%program, ?args, "running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, &e))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn status(&self, program: &str, args: &[&str], envs: &[(&str, &str)]) -> Result<i32> {
        tracing::debug!(%program, ?args, "spawning child");
        let mut command = Command::new(program);
        command.args(args);
        for (key, value) in envs {
            command.env(key, value);
        }
        let status = command.status().map_err(|e| spawn_error(program, &e))?;
        Ok(status.code().unwrap_or(crate::error::category::EXIT_GENERAL))
    }
}
