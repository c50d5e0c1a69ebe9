//! Detecting installed tools and their versions

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AlbtError, Result};
use crate::process::CommandRunner;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap()
});

/// Dotted numeric version as reported by a tool (`git version 2.43.0` etc.)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedVersion {
    parts: [u64; 3],
    raw: String,
}

impl ProbedVersion {
    /// First `major.minor[.patch]` in `text`
    pub fn extract(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text)?;
        let part = |i: usize| {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0)
        };
        Some(Self {
            parts: [part(1), part(2), part(3)],
            raw: caps.get(0)?.as_str().to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn satisfies(&self, minimum: &str) -> bool {
        Self::extract(minimum).is_none_or(|min| self >= &min)
    }
}

impl PartialOrd for ProbedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProbedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

/// How a tool's presence is detected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Run `<program> <args>` and read the version from its output
    Command {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// Ask PowerShell for the newest installed version of a module
    PwshModule(&'static str),
}

/// Result of probing a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Absent,
    /// Present; `None` when the output carried no recognizable version
    Present(Option<ProbedVersion>),
}

pub fn module_query(module: &str) -> String {
    format!(
        "$m = Get-Module -ListAvailable -Name {module} | Sort-Object Version -Descending | Select-Object -First 1; if ($m) {{ $m.Version.ToString() }} else {{ exit 1 }}"
    )
}

impl Probe {
    pub fn run(&self, runner: &dyn CommandRunner) -> Result<Detection> {
        let output = match self {
            Self::Command { program, args } => runner.output(program, args),
            Self::PwshModule(module) => {
                let query = module_query(module);
                runner.output("pwsh", &["-NoProfile", "-NonInteractive", "-Command", &query])
            }
        };
        let output = match output {
            Ok(output) => output,
            Err(AlbtError::MissingTool { .. }) => return Ok(Detection::Absent),
            Err(e) => return Err(e),
        };
        if !output.success() {
            tracing::debug!(probe = ?self, summary = %output.summary(), "probe failed");
            return Ok(Detection::Absent);
        }
        let text = format!("{}\n{}", output.stdout, output.stderr);
        Ok(Detection::Present(ProbedVersion::extract(&text)))
    }
}
