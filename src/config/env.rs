//! Environment layer of the configuration
//!
//! This is the only place in albt that reads `ALBT_*` and token variables.

use std::path::PathBuf;
use std::time::Duration;

use super::Config;
use crate::error::{AlbtError, Result};

pub const REMOTE_URL: &str = "ALBT_REMOTE_URL";
pub const REF: &str = "ALBT_REF";
pub const SOURCE_SUBDIR: &str = "ALBT_SOURCE_SUBDIR";
pub const CACHE_DIR: &str = "ALBT_CACHE_DIR";
pub const HTTP_TIMEOUT_SECS: &str = "ALBT_HTTP_TIMEOUT_SECS";
pub const RETRY_DELAY_SECS: &str = "ALBT_RETRY_DELAY_SECS";
pub const NUGET_FEED: &str = "ALBT_NUGET_FEED";
pub const PACKAGE_ID: &str = "ALBT_COMPILER_PACKAGE";
pub const LOG: &str = "ALBT_LOG";

/// Set by the task orchestrator on the child process it spawns, never on itself
pub const VIA_ORCHESTRATOR: &str = "ALBT_VIA_ORCHESTRATOR";

const GITHUB_TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Lookup against the real process environment; empty values count as unset
pub fn process_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Overlay environment values onto `config`
pub fn apply(config: &mut Config, lookup: &dyn Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = lookup(REMOTE_URL) {
        config.remote_url = v;
    }
    if let Some(v) = lookup(REF) {
        config.source_ref = Some(v);
    }
    if let Some(v) = lookup(SOURCE_SUBDIR) {
        config.source_subdir = v;
    }
    if let Some(v) = lookup(CACHE_DIR) {
        config.cache_root = PathBuf::from(v);
    }
    if let Some(v) = lookup(HTTP_TIMEOUT_SECS) {
        config.http_timeout = parse_secs(HTTP_TIMEOUT_SECS, &v)?;
    }
    if let Some(v) = lookup(RETRY_DELAY_SECS) {
        config.retry_delay = parse_secs(RETRY_DELAY_SECS, &v)?;
    }
    if let Some(v) = lookup(NUGET_FEED) {
        config.nuget_feed = v;
    }
    if let Some(v) = lookup(PACKAGE_ID) {
        config.package_id = Some(v);
    }
    if let Some(v) = lookup(LOG) {
        config.log_filter = Some(v);
    }
    if let Some(token) = GITHUB_TOKEN_VARS.iter().find_map(|k| lookup(k)) {
        config.github_token = Some(token);
    }
    config.via_orchestrator = lookup(VIA_ORCHESTRATOR).is_some_and(|v| is_truthy(&v));
    Ok(())
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| AlbtError::ConfigInvalid {
            message: format!("{key} must be a whole number of seconds, got '{value}'"),
        })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
