//! Install command

use super::{SystemServices, absolute_or_cwd};
use crate::cli::InstallArgs;
use crate::config::Config;
use crate::error::Result;
use crate::operations::{InstallOperation, InstallOptions};

impl InstallOptions {
    fn from_args(args: &InstallArgs) -> Result<Self> {
        Ok(Self {
            destination: absolute_or_cwd(args.dest.as_deref())?,
            require_clean: args.require_clean,
            prerequisites: args.prerequisites || args.auto_install,
            auto_install: args.auto_install,
            commit: args.commit || args.commit_message.is_some(),
            commit_message: args.commit_message.clone(),
            provision: args.provision,
            runtime: args.runtime.clone(),
            compiler_version: args.compiler_version.clone(),
            transcript: args.transcript.clone(),
        })
    }
}

pub fn run(args: &InstallArgs, config: &Config) -> Result<()> {
    let options = InstallOptions::from_args(args)?;
    let system = SystemServices::new(config)?;
    tracing::info!(
        destination = %options.destination.display(),
        reference = config.ref_label(),
        "installing overlay"
    );

    let summary = InstallOperation::new(config, system.services(), options).execute()?;
    tracing::info!(
        files = summary.result.files_copied,
        tag = %summary.reference.resolved_tag,
        repository = %summary.repository.root.display(),
        commit = ?summary.commit,
        "install finished"
    );
    if let Some(sentinel) = &summary.sentinel {
        println!("{}", sentinel.tool_path.display());
    }
    Ok(())
}
