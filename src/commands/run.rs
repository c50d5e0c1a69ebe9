//! Task bridge
//!
//! Starts a task as a child process marked as orchestrated. The marker variable is set
//! on the child's command only; this process's environment is never touched.

use std::path::{Path, PathBuf};

use crate::cli::RunArgs;
use crate::config::env::VIA_ORCHESTRATOR;
use crate::error::Result;
use crate::process::CommandRunner;

/// Tasks implemented by albt itself
const BUILTIN_TASKS: &[&str] = &["provision", "prereqs"];

const DEFAULT_BUILD_FILE: &str = "build.ps1";

/// Global flags forwarded to built-in tasks
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Program and arguments that run `args.task`
fn task_command(args: &RunArgs, global: &GlobalArgs) -> Result<(PathBuf, Vec<String>)> {
    if BUILTIN_TASKS.contains(&args.task.as_str()) {
        let exe = std::env::current_exe()?;
        let mut argv = vec![args.task.clone()];
        argv.extend(args.args.iter().cloned());
        if let Some(config) = &global.config {
            argv.push("--config".to_string());
            argv.push(config.display().to_string());
        }
        if let Some(dir) = &global.cache_dir {
            argv.push("--cache-dir".to_string());
            argv.push(dir.display().to_string());
        }
        return Ok((exe, argv));
    }

    let build_file = match &args.build_file {
        Some(file) => file.clone(),
        None => super::absolute_or_cwd(None)?.join(DEFAULT_BUILD_FILE),
    };
    Ok((PathBuf::from("pwsh"), invoke_build_args(&args.task, &build_file, &args.args)))
}

fn invoke_build_args(task: &str, build_file: &Path, extra: &[String]) -> Vec<String> {
    let mut script = format!(
        "Invoke-Build {task} -File '{}'",
        build_file.display().to_string().replace('\'', "''")
    );
    for arg in extra {
        script.push(' ');
        script.push_str(arg);
    }
    vec![
        "-NoProfile".to_string(),
        "-NonInteractive".to_string(),
        "-Command".to_string(),
        script,
    ]
}

/// Run the task and return its exit code
pub fn run(args: &RunArgs, global: &GlobalArgs, runner: &dyn CommandRunner) -> Result<i32> {
    let (program, argv) = task_command(args, global)?;
    let program = program.to_string_lossy();
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    tracing::info!(task = %args.task, %program, "starting orchestrated task");

    let code = runner.status(&program, &argv, &[(VIA_ORCHESTRATOR, "1")])?;
    tracing::debug!(task = %args.task, code, "task finished");
    Ok(code)
}
