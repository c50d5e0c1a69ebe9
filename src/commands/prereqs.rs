//! Prerequisite check command

use super::SystemServices;
use crate::cli::PrereqsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::prereq::{Outcome, Provisioner};

pub fn run(args: &PrereqsArgs, config: &Config) -> Result<()> {
    let system = SystemServices::new(config)?;
    let services = system.services();
    let outcomes = Provisioner::new(
        services.runner,
        services.prompt,
        services.emitter,
        !args.auto_install,
    )
    .ensure_all()?;

    let installed = outcomes
        .iter()
        .filter(|o| matches!(o, Outcome::Installed(_)))
        .count();
    tracing::info!(
        tools = outcomes.len(),
        installed,
        "prerequisites satisfied"
    );
    Ok(())
}
