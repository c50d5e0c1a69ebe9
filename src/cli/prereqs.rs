use clap::Parser;

/// Arguments for the prereqs command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Check prerequisites, asking before each install:\n    albt prereqs\n\n\
                  Install everything missing without prompts (CI):\n    albt prereqs --auto-install")]
pub struct PrereqsArgs {
    /// Install missing tools without asking
    #[arg(long = "auto-install")]
    pub auto_install: bool,
}
