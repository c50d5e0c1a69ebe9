//! Prerequisite provisioning
//!
//! Each required tool is probed, and when it is missing or too old it is installed
//! through the OS package manager (after confirmation in interactive mode) and probed
//! again. Tools are handled strictly one after another in [`tools::required_tools`]
//! order: installers mutate global state such as PATH and must not race.

pub mod probe;
pub mod prompt;
pub mod tools;

pub use prompt::{Prompt, TerminalPrompt};
pub use tools::{PackageManager, ToolSpec, required_tools};

use std::fmt;

use crate::diagnostics::{Emitter, Marker};
use crate::error::{AlbtError, ErrorCategory, Result};
use crate::process::CommandRunner;
use probe::{Detection, ProbedVersion};

/// Status of one tool as reported in `prerequisite` markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrereqStatus {
    Present,
    Missing,
    Installing,
    Installed,
    Insufficient,
    Failed,
}

impl PrereqStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Missing => "missing",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Insufficient => "insufficient",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PrereqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tool ended up available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Present(Option<String>),
    Installed(Option<String>),
}

enum Check {
    Satisfied(Option<ProbedVersion>),
    Unsatisfied(PrereqStatus, Option<ProbedVersion>),
}

pub struct Provisioner<'a> {
    runner: &'a dyn CommandRunner,
    prompt: &'a dyn Prompt,
    emitter: &'a Emitter,
    manager: PackageManager,
    interactive: bool,
}

impl<'a> Provisioner<'a> {
    /// `interactive` asks before every install; otherwise installs run unattended
    pub fn new(
        runner: &'a dyn CommandRunner,
        prompt: &'a dyn Prompt,
        emitter: &'a Emitter,
        interactive: bool,
    ) -> Self {
        Self {
            runner,
            prompt,
            emitter,
            manager: PackageManager::for_current_os(),
            interactive,
        }
    }

    #[cfg(test)]
    pub fn with_package_manager(mut self, manager: PackageManager) -> Self {
        self.manager = manager;
        self
    }

    /// Ensure every required tool, stopping at the first one that cannot be provided
    pub fn ensure_all(&self) -> Result<Vec<Outcome>> {
        required_tools(self.manager)
            .iter()
            .map(|spec| self.ensure_tool(spec))
            .collect()
    }

    fn emit(&self, spec: &ToolSpec, status: PrereqStatus, version: Option<&ProbedVersion>) {
        self.emitter.emit(&Marker::prerequisite(
            spec.name,
            status.as_str(),
            version.map(ProbedVersion::as_str),
        ));
    }

    fn check(&self, spec: &ToolSpec) -> Result<Check> {
        Ok(match spec.probe.run(self.runner)? {
            Detection::Absent => Check::Unsatisfied(PrereqStatus::Missing, None),
            Detection::Present(Some(version)) => match spec.minimum {
                Some(min) if !version.satisfies(min) => {
                    Check::Unsatisfied(PrereqStatus::Insufficient, Some(version))
                }
                _ => Check::Satisfied(Some(version)),
            },
            Detection::Present(None) => Check::Satisfied(None),
        })
    }

    pub fn ensure_tool(&self, spec: &ToolSpec) -> Result<Outcome> {
        let (status, found) = match self.check(spec)? {
            Check::Satisfied(version) => {
                self.emit(spec, PrereqStatus::Present, version.as_ref());
                return Ok(Outcome::Present(version.map(|v| v.as_str().to_string())));
            }
            Check::Unsatisfied(status, version) => (status, version),
        };
        self.emit(spec, status, found.as_ref());
        tracing::info!(tool = spec.name, %status, "prerequisite not satisfied");

        let Some(command) = spec.install_command(self.manager) else {
            self.emit(spec, PrereqStatus::Failed, None);
            return Err(missing_tool(
                spec,
                "cannot be installed automatically on this platform",
            ));
        };

        if self.interactive {
            let question = match spec.minimum {
                Some(min) if status == PrereqStatus::Insufficient => {
                    format!("{} {min} or newer is required. Install it now?", spec.name)
                }
                _ => format!("{} is required. Install it now?", spec.name),
            };
            if !self.prompt.confirm(&question, true)? {
                self.emitter.emit(
                    &Marker::guard(ErrorCategory::MissingTool).field("tool", spec.name),
                );
                return Err(missing_tool(spec, "installation declined"));
            }
        }

        self.emit(spec, PrereqStatus::Installing, None);
        let output = match self.runner.output(&command.program, &command.arg_refs()) {
            Ok(output) => output,
            Err(e) => {
                self.emit(spec, PrereqStatus::Failed, None);
                return Err(missing_tool(spec, &e.to_string()));
            }
        };
        if !output.success() {
            self.emit(spec, PrereqStatus::Failed, None);
            return Err(missing_tool(
                spec,
                &format!("{} failed: {}", command.program, output.summary()),
            ));
        }

        match self.check(spec)? {
            Check::Satisfied(version) => {
                self.emit(spec, PrereqStatus::Installed, version.as_ref());
                Ok(Outcome::Installed(version.map(|v| v.as_str().to_string())))
            }
            Check::Unsatisfied(_, version) => {
                self.emit(spec, PrereqStatus::Failed, version.as_ref());
                Err(missing_tool(spec, "still not usable after installation"))
            }
        }
    }
}

fn missing_tool(spec: &ToolSpec, reason: &str) -> AlbtError {
    AlbtError::MissingTool {
        tool: spec.name.to_string(),
        reason: reason.to_string(),
    }
}
