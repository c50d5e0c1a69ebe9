use clap::Parser;
use std::path::PathBuf;

/// Arguments for the provision command
#[derive(Parser, Debug)]
#[command(after_help = "This command is started by the task orchestrator. Run it as:\n    \
                  albt run provision\n\n\
                  EXAMPLES:\n  \
                  Provision for the runtime declared in app.json:\n    albt run provision\n\n\
                  Provision an exact compiler version:\n    albt run provision --compiler-version 16.0.21.53261")]
pub struct ProvisionArgs {
    /// Project directory searched for app.json (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Business Central runtime to provision for
    #[arg(long, value_name = "VERSION")]
    pub runtime: Option<String>,

    /// Exact compiler version to provision
    #[arg(long = "compiler-version", value_name = "VERSION")]
    pub compiler_version: Option<String>,

    /// Append every diagnostic line to this file as well
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}
