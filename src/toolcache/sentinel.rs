//! Persisted record of the provisioned compiler
//!
//! One `sentinel.json` per tool root. It is the single source of truth for "what is
//! installed", so it is only ever replaced atomically (write to a temp file in the same
//! directory, then rename).

use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AlbtError, Result};

pub const SENTINEL_FILE: &str = "sentinel.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallationType {
    Global,
    #[default]
    LocalTool,
    MigratedGlobal,
}

impl fmt::Display for InstallationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Global => "global",
            Self::LocalTool => "local-tool",
            Self::MigratedGlobal => "migrated-global",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSentinel {
    #[serde(default)]
    pub compiler_version: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub tool_path: PathBuf,
    #[serde(default)]
    pub package_id: String,
    #[serde(default)]
    pub installation_type: InstallationType,
    #[serde(default)]
    pub timestamp_utc: String,
}

/// What a provisioning run asks for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub runtime: Option<String>,
    pub version: Option<String>,
}

/// Runtime recorded when no runtime was requested
pub const ANY_RUNTIME: &str = "any";

impl ToolSentinel {
    pub fn new(
        compiler_version: &str,
        runtime: Option<&str>,
        tool_path: PathBuf,
        package_id: &str,
        installation_type: InstallationType,
    ) -> Self {
        Self {
            compiler_version: compiler_version.to_string(),
            runtime: runtime.unwrap_or(ANY_RUNTIME).to_string(),
            tool_path,
            package_id: package_id.to_string(),
            installation_type,
            timestamp_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Check the sentinel against the file system and `request`
    ///
    /// Returns the reason the sentinel cannot be reused.
    pub fn validate(&self, request: &ProvisionRequest) -> std::result::Result<(), String> {
        let required = [
            ("compilerVersion", self.compiler_version.trim().is_empty()),
            ("runtime", self.runtime.trim().is_empty()),
            ("toolPath", self.tool_path.as_os_str().is_empty()),
            ("timestampUtc", self.timestamp_utc.trim().is_empty()),
        ];
        if let Some((field, _)) = required.iter().find(|(_, missing)| *missing) {
            return Err(format!("missing field {field}"));
        }
        if !self.tool_path.is_file() {
            return Err(format!("executable not found: {}", self.tool_path.display()));
        }
        if let Some(version) = &request.version {
            if version != &self.compiler_version {
                return Err(format!(
                    "version {} does not match requested {version}",
                    self.compiler_version
                ));
            }
        }
        if let Some(runtime) = &request.runtime {
            if runtime != &self.runtime {
                return Err(format!(
                    "runtime {} does not match requested {runtime}",
                    self.runtime
                ));
            }
        }
        Ok(())
    }

    /// Replace the sentinel at `path` atomically
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = path.parent().ok_or_else(|| AlbtError::IoError {
            message: format!("sentinel path has no parent: {}", path.display()),
        })?;
        std::fs::create_dir_all(dir).map_err(|e| crate::error::fs::write_failed(dir, e))?;

        let json = serde_json::to_string_pretty(self).map_err(|e| AlbtError::Unknown {
            message: format!("Failed to serialize sentinel: {e}"),
        })?;
        let mut temp = tempfile::Builder::new()
            .prefix(".sentinel-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| crate::error::fs::write_failed(dir, e))?;
        temp.write_all(json.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| crate::error::fs::write_failed(temp.path(), e))?;
        temp.persist(path)
            .map_err(|e| crate::error::fs::write_failed(path, e.error))?;
        Ok(())
    }
}

/// Result of reading a sentinel file
#[derive(Debug)]
pub enum Loaded {
    Missing,
    Corrupt(String),
    Present(ToolSentinel),
}

pub fn load(path: &Path) -> Result<Loaded> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::Missing),
        Err(e) if e.kind() == ErrorKind::InvalidData => return Ok(Loaded::Corrupt(e.to_string())),
        Err(e) => return Err(crate::error::fs::read_failed(path, e)),
    };
    match serde_json::from_str::<ToolSentinel>(&content) {
        Ok(sentinel) => Ok(Loaded::Present(sentinel)),
        Err(e) => Ok(Loaded::Corrupt(e.to_string())),
    }
}

/// Move a corrupt sentinel aside as `sentinel.json.corrupt-<timestamp>`
pub fn backup_corrupt(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let file_name = path
        .file_name()
        .map_or_else(|| SENTINEL_FILE.into(), |n| n.to_string_lossy().into_owned());
    let backup = path.with_file_name(format!("{file_name}.corrupt-{stamp}"));
    std::fs::rename(path, &backup).map_err(|e| crate::error::fs::write_failed(&backup, e))?;
    Ok(backup)
}
