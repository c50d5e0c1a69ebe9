//! Command implementations for the albt CLI

pub mod cache;
pub mod completions;
pub mod install;
pub mod prereqs;
pub mod provision;
pub mod run;

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::diagnostics::Emitter;
use crate::error::Result;
use crate::guard::InvocationContext;
use crate::operations::Services;
use crate::prereq::TerminalPrompt;
use crate::process::SystemRunner;
use crate::transport::DefaultTransport;

/// Production collaborators backing [`Services`]
pub struct SystemServices {
    transport: DefaultTransport,
    runner: SystemRunner,
    prompt: TerminalPrompt,
    emitter: Emitter,
}

impl SystemServices {
    /// Real network, processes and terminal; markers go to stdout
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            transport: DefaultTransport::from_config(config)?,
            runner: SystemRunner,
            prompt: TerminalPrompt,
            emitter: Emitter::stdout(),
        })
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            transport: &self.transport,
            runner: &self.runner,
            prompt: &self.prompt,
            emitter: &self.emitter,
        }
    }
}

/// Directory argument, or the current directory, as an absolute path
pub fn absolute_or_cwd(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(std::path::absolute(&dir)?)
}

/// Run the parsed command; returns the process exit code
pub fn dispatch(cli: Cli, config: &Config, context: InvocationContext) -> Result<i32> {
    let global = run::GlobalArgs {
        config: cli.config.clone(),
        cache_dir: cli.cache_dir.clone(),
    };
    match cli.command {
        Commands::Install(args) => install::run(&args, config).map(|()| 0),
        Commands::Provision(args) => provision::run(&args, config, context).map(|()| 0),
        Commands::Prereqs(args) => prereqs::run(&args, config).map(|()| 0),
        Commands::Cache(args) => cache::run(args, config).map(|()| 0),
        Commands::Run(args) => run::run(&args, &global, &SystemRunner),
        Commands::Completions(args) => completions::run(&args).map(|()| 0),
    }
}
