//! Optional YAML configuration file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::Config;
use crate::error::{AlbtError, Result};

/// On-disk configuration; every field is optional
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub remote_url: Option<String>,
    pub source_ref: Option<String>,
    pub source_subdir: Option<String>,
    pub cache_root: Option<PathBuf>,
    pub http_timeout_secs: Option<u64>,
    pub retry_delay_secs: Option<u64>,
    pub metadata_ttl_secs: Option<u64>,
    pub nuget_feed: Option<String>,
    pub package_id: Option<String>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AlbtError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str::<Option<Self>>(&content)
            .map(Option::unwrap_or_default)
            .map_err(|e| AlbtError::ConfigParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    pub fn apply(self, config: &mut Config) {
        if let Some(v) = self.remote_url {
            config.remote_url = v;
        }
        if let Some(v) = self.source_ref {
            config.source_ref = Some(v);
        }
        if let Some(v) = self.source_subdir {
            config.source_subdir = v;
        }
        if let Some(v) = self.cache_root {
            config.cache_root = v;
        }
        if let Some(v) = self.http_timeout_secs {
            config.http_timeout = Duration::from_secs(v);
        }
        if let Some(v) = self.retry_delay_secs {
            config.retry_delay = Duration::from_secs(v);
        }
        if let Some(v) = self.metadata_ttl_secs {
            config.metadata_ttl = Duration::from_secs(v);
        }
        if let Some(v) = self.nuget_feed {
            config.nuget_feed = v;
        }
        if let Some(v) = self.package_id {
            config.package_id = Some(v);
        }
    }
}
