//! Tracing setup
//!
//! Logs go to stderr so stdout carries nothing but diagnostic markers and command
//! output.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";
const VERBOSE_FILTER: &str = "albt=debug,info";

/// Filter directive: explicit filter, else `-v`, else warnings only
pub fn filter_directive(filter: Option<&str>, verbose: bool) -> String {
    match filter {
        Some(f) => f.to_string(),
        None if verbose => VERBOSE_FILTER.to_string(),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber; a second call is a no-op
pub fn init(filter: Option<&str>, verbose: bool) {
    let directive = filter_directive(filter, verbose);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("warning: invalid log filter '{directive}': {e}");
        EnvFilter::new(DEFAULT_FILTER)
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
