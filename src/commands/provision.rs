//! Provision command

use super::{SystemServices, absolute_or_cwd};
use crate::cli::ProvisionArgs;
use crate::config::Config;
use crate::diagnostics::{Emitter, Marker};
use crate::error::Result;
use crate::guard::{InvocationContext, OrchestratorToken};
use crate::operations::{ProvisionOperation, ProvisionOptions};

const COMMAND: &str = "provision";

/// Check the orchestrator capability, reporting a refusal as a guard marker
fn authorize(context: InvocationContext, emitter: &Emitter) -> Result<OrchestratorToken> {
    context.require_orchestrator(COMMAND).inspect_err(|e| {
        emitter.emit(&Marker::guard(e.category()).field("command", COMMAND));
    })
}

pub fn run(args: &ProvisionArgs, config: &Config, context: InvocationContext) -> Result<()> {
    let system = SystemServices::new(config)?;
    let services = system.services();
    let _token = authorize(context, services.emitter)?;
    if let Some(path) = &args.transcript {
        services.emitter.attach_transcript(path)?;
    }

    let options = ProvisionOptions {
        project_root: absolute_or_cwd(args.project.as_deref())?,
        runtime: args.runtime.clone(),
        compiler_version: args.compiler_version.clone(),
    };
    let sentinel = ProvisionOperation::new(config, services).execute(&options)?;
    println!("{}", sentinel.tool_path.display());
    Ok(())
}
