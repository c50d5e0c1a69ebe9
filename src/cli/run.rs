use clap::Parser;
use std::path::PathBuf;

/// Arguments for the run command
#[derive(Parser, Debug)]
#[command(after_help = "Built-in tasks (provision, prereqs) run albt itself; any other task is \
                  passed to Invoke-Build.\n\n\
                  EXAMPLES:\n  \
                  Provision the compiler:\n    albt run provision\n\n\
                  Run the build task of build.ps1:\n    albt run build\n\n\
                  Run a task from another build script:\n    albt run test --build-file overlay/al.build.ps1")]
pub struct RunArgs {
    /// Task name
    pub task: String,

    /// Invoke-Build script (defaults to build.ps1 in the current directory)
    #[arg(long = "build-file", value_name = "PATH")]
    pub build_file: Option<PathBuf>,

    /// Arguments passed through to the task
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
