//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - provision: Compiler provisioning arguments
//! - prereqs: Prerequisite check arguments
//! - cache: Cache command arguments
//! - run: Task bridge arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

pub mod cache;
pub mod completions;
pub mod install;
pub mod prereqs;
pub mod provision;
pub mod run;

pub use cache::{CacheArgs, CacheSubcommand};
pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use prereqs::PrereqsArgs;
pub use provision::ProvisionArgs;
pub use run::RunArgs;

/// albt - AL build tools installer
///
/// Install the AL build-tools overlay into a Business Central project and provision
/// the toolchain it needs.
#[derive(Parser, Debug)]
#[command(
    name = "albt",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Installer and toolchain provisioner for the AL build-tools overlay",
    long_about = "albt copies the AL build-tools overlay from a release archive into a git \
                  repository, checks the prerequisites the build needs and provisions the AL \
                  compiler into a local tool cache.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  albt install                          \x1b[90m# Install overlay from main into cwd\x1b[0m\n   \
                  albt install --latest --commit        \x1b[90m# Latest release, committed\x1b[0m\n   \
                  albt install --provision              \x1b[90m# Also provision the compiler\x1b[0m\n   \
                  albt run build                        \x1b[90m# Run an Invoke-Build task\x1b[0m\n   \
                  albt cache show                       \x1b[90m# Show the provisioned compiler\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/albt/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root of the compiler tool cache
    #[arg(long = "cache-dir", global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the overlay into a git repository
    Install(InstallArgs),

    /// Provision the AL compiler (orchestrated tasks only)
    Provision(ProvisionArgs),

    /// Check and install build prerequisites
    Prereqs(PrereqsArgs),

    /// Inspect or clear the compiler tool cache
    #[command(name = "cache")]
    Cache(CacheArgs),

    /// Run a build task through the task orchestrator
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Cli {
    /// Configuration values given on the command line
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            cache_root: self.cache_dir.clone(),
            ..Overrides::default()
        };
        if let Commands::Install(args) = &self.command {
            overrides.remote_url.clone_from(&args.remote);
            overrides.source_ref.clone_from(&args.reference);
            overrides.latest = args.latest;
            overrides.source_subdir.clone_from(&args.source_subdir);
        }
        overrides
    }
}
