//! albt - AL build tools installer
//!
//! Installs the AL build-tools overlay into Business Central projects, checks the
//! prerequisites its build needs and provisions the AL compiler into a local cache.

use clap::Parser;
use clap::error::{ContextKind, ErrorKind};
use console::Style;

mod cli;
mod commands;
mod config;
mod diagnostics;
mod error;
mod fetcher;
mod guard;
mod hash;
mod installer;
mod logging;
mod operations;
mod prereq;
mod process;
mod progress;
mod resolver;
mod retry;
mod temp;
mod toolcache;
mod transport;

use cli::Cli;
use config::{Config, env};
use diagnostics::{Emitter, Marker};
use error::{AlbtError, ErrorCategory, category};
use guard::InvocationContext;

/// Print the category line and hint for a failed run
///
/// Both lines carry the category so a reader of only the last line still gets it.
fn report(err: &AlbtError) {
    let label = Style::new().red().bold().for_stderr();
    eprintln!(
        "{}: {err}",
        label.apply_to(format!("error[{}]", err.category()))
    );
    if let Some(hint) = hint_line(err) {
        eprintln!("{hint}");
    }
}

fn hint_line(err: &AlbtError) -> Option<String> {
    err.hint()
        .map(|hint| format!("  hint[{}]: {hint}", err.category()))
}

/// Parse arguments; usage errors are refused as `UnknownParameter` guard violations
fn parse_args() -> Result<Cli, i32> {
    let err = match Cli::try_parse() {
        Ok(cli) => return Ok(cli),
        Err(err) => err,
    };
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        let _ = err.print();
        return Err(category::EXIT_SUCCESS);
    }

    let argument = err
        .get(ContextKind::InvalidArg)
        .map_or_else(|| err.kind().to_string(), |arg| arg.to_string());
    Emitter::stdout().emit(&Marker::guard(ErrorCategory::UnknownParameter).field("argument", argument));
    let _ = err.print();
    Err(ErrorCategory::UnknownParameter.exit_code())
}

fn run() -> i32 {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let config = Config::load(cli.config.as_deref(), &cli.overrides());
    let log_filter = match &config {
        Ok(config) => config.log_filter.clone(),
        Err(_) => env::process_lookup(env::LOG),
    };
    logging::init(log_filter.as_deref(), cli.verbose);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            return e.exit_code();
        }
    };

    let context = InvocationContext::from_config(&config);
    match commands::dispatch(cli, &config, context) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            report(&e);
            e.exit_code()
        }
    }
}

fn main() {
    // run() owns every resource, so temp workspaces are gone before the process exits
    let code = run();
    std::process::exit(code);
}
