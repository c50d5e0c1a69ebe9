//! Runtime configuration
//!
//! A single [`Config`] is assembled once at startup from, in increasing precedence:
//!
//! 1. built-in defaults
//! 2. an optional YAML file (`<config dir>/albt/config.yaml` or `--config <path>`)
//! 3. environment variables (see [`env`])
//! 4. explicit command line parameters ([`Overrides`])
//!
//! Core modules only ever see the assembled struct; they never read the environment.

pub mod env;
mod file;

pub use file::FileConfig;

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::{AlbtError, Result};

/// Upstream repository publishing the overlay
pub const DEFAULT_REMOTE_URL: &str = "https://github.com/FBakkensen/al-build-tools";

/// Stable branch installed when no ref is given
pub const DEFAULT_REF: &str = "main";

/// Directory inside the archive that holds the overlay payload
pub const DEFAULT_SOURCE_SUBDIR: &str = "overlay";

/// NuGet flat-container endpoint used to list compiler versions
pub const DEFAULT_NUGET_FEED: &str = "https://api.nuget.org/v3-flatcontainer";

/// Directory name of the tool cache under the user's home directory
const CACHE_DIR_NAME: &str = ".albt-cache";

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Repository the overlay archives are downloaded from (`https://` or `file://`)
    pub remote_url: String,
    /// Tag or branch to install; `None` selects the latest published release
    pub source_ref: Option<String>,
    /// Name of the payload directory inside the archive
    pub source_subdir: String,
    /// Upper bound for each network request
    pub http_timeout: Duration,
    /// Delay before the single retry of downloads and metadata fetches
    pub retry_delay: Duration,
    /// Lifetime of cached release metadata within one run
    pub metadata_ttl: Duration,
    /// Root of the compiler tool cache (holds `<tool>/sentinel.json`)
    pub cache_root: PathBuf,
    /// NuGet flat-container base URL
    pub nuget_feed: String,
    /// Compiler package id override; platform default when `None`
    pub package_id: Option<String>,
    /// Token sent to the GitHub API to lift anonymous rate limits
    pub github_token: Option<String>,
    /// Tracing filter directive (`ALBT_LOG`)
    pub log_filter: Option<String>,
    /// Whether this process was started by the task orchestrator
    pub via_orchestrator: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            source_ref: Some(DEFAULT_REF.to_string()),
            source_subdir: DEFAULT_SOURCE_SUBDIR.to_string(),
            http_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            metadata_ttl: Duration::from_secs(300),
            cache_root: default_cache_root(),
            nuget_feed: DEFAULT_NUGET_FEED.to_string(),
            package_id: None,
            github_token: None,
            log_filter: None,
            via_orchestrator: false,
        }
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub remote_url: Option<String>,
    pub source_ref: Option<String>,
    pub latest: bool,
    pub source_subdir: Option<String>,
    pub cache_root: Option<PathBuf>,
}

fn default_cache_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(crate::temp::temp_dir_base)
        .join(CACHE_DIR_NAME)
}

/// Default location of the optional YAML config file
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("albt").join("config.yaml"))
}

impl Config {
    /// Assemble the configuration from the process environment
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with(config_file, overrides, &env::process_lookup)
    }

    /// Assemble the configuration with an explicit environment lookup
    pub fn load_with(
        config_file: Option<&Path>,
        overrides: &Overrides,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        match config_file {
            Some(path) => FileConfig::read(path)?.apply(&mut config),
            None => {
                if let Some(path) = default_config_file().filter(|p| p.is_file()) {
                    FileConfig::read(&path)?.apply(&mut config);
                }
            }
        }

        env::apply(&mut config, lookup)?;
        config.apply_overrides(overrides);
        config.validate()?;

        tracing::debug!(
            remote = %config.remote_url,
            reference = ?config.source_ref,
            cache_root = %config.cache_root.display(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(remote) = &overrides.remote_url {
            self.remote_url.clone_from(remote);
        }
        if overrides.latest {
            self.source_ref = None;
        } else if let Some(reference) = &overrides.source_ref {
            self.source_ref = Some(reference.clone());
        }
        if let Some(subdir) = &overrides.source_subdir {
            self.source_subdir.clone_from(subdir);
        }
        if let Some(root) = &overrides.cache_root {
            self.cache_root.clone_from(root);
        }
    }

    /// Check invariants the rest of the program relies on
    pub fn validate(&self) -> Result<()> {
        let remote = self.remote_url.trim();
        if !(remote.starts_with("https://")
            || remote.starts_with("http://")
            || remote.starts_with("file://"))
        {
            return Err(invalid(format!(
                "remote URL must use https://, http:// or file://: '{}'",
                self.remote_url
            )));
        }

        if self.source_ref.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(invalid("source ref must not be empty"));
        }

        let subdir = Path::new(&self.source_subdir);
        let is_plain_relative = !self.source_subdir.is_empty()
            && subdir
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain_relative {
            return Err(invalid(format!(
                "source subdirectory must be a relative path without '..': '{}'",
                self.source_subdir
            )));
        }

        if self.http_timeout.is_zero() {
            return Err(invalid("HTTP timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Label of the requested ref for diagnostics (`latest` when resolving releases)
    pub fn ref_label(&self) -> &str {
        self.source_ref.as_deref().unwrap_or("latest")
    }
}

fn invalid(message: impl Into<String>) -> AlbtError {
    AlbtError::ConfigInvalid {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    /// An empty config file keeps the user's real config file out of tests
    fn empty_file() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "{}\n").unwrap();
        (temp, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.remote_url, DEFAULT_REMOTE_URL);
        assert_eq!(config.source_ref.as_deref(), Some("main"));
        assert_eq!(config.source_subdir, "overlay");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert!(config.cache_root.ends_with(".albt-cache"));
        assert!(!config.via_orchestrator);
    }

    #[test]
    fn test_env_overrides_defaults() {
        let (_temp, file) = empty_file();
        let lookup = lookup_from(&[("ALBT_REF", "v1.2.0"), ("ALBT_SOURCE_SUBDIR", "payload")]);
        let config = Config::load_with(Some(&file), &Overrides::default(), &lookup).unwrap();
        assert_eq!(config.source_ref.as_deref(), Some("v1.2.0"));
        assert_eq!(config.source_subdir, "payload");
    }

    #[test]
    fn test_parameters_override_env() {
        let (_temp, file) = empty_file();
        let lookup = lookup_from(&[("ALBT_REF", "v1.2.0")]);
        let overrides = Overrides {
            source_ref: Some("develop".to_string()),
            ..Overrides::default()
        };
        let config = Config::load_with(Some(&file), &overrides, &lookup).unwrap();
        assert_eq!(config.source_ref.as_deref(), Some("develop"));
    }

    #[test]
    fn test_latest_clears_ref() {
        let (_temp, file) = empty_file();
        let overrides = Overrides {
            latest: true,
            source_ref: Some("ignored".to_string()),
            ..Overrides::default()
        };
        let config = Config::load_with(Some(&file), &overrides, &lookup_from(&[])).unwrap();
        assert_eq!(config.source_ref, None);
        assert_eq!(config.ref_label(), "latest");
    }

    #[test]
    fn test_file_layer_between_defaults_and_env() {
        let temp = tempfile::TempDir::new_in(crate::temp::temp_dir_base()).unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "remote_url: https://github.com/example/fork\nsource_ref: release\nhttp_timeout_secs: 10\n",
        )
        .unwrap();
        let lookup = lookup_from(&[("ALBT_REF", "from-env")]);
        let config = Config::load_with(Some(&path), &Overrides::default(), &lookup).unwrap();
        assert_eq!(config.remote_url, "https://github.com/example/fork");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.source_ref.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_rejects_parent_dir_subdir() {
        let config = Config {
            source_subdir: "../escape".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AlbtError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let config = Config {
            remote_url: "ftp://example.test/repo".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_nested_subdir() {
        let config = Config {
            source_subdir: "dist/overlay".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
