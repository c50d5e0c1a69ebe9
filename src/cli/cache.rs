use clap::{Parser, Subcommand};

/// Arguments for cache command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the provisioned compiler:\n    albt cache\n\n\
                  Remove the compiler and its sentinel:\n    albt cache clear\n\n\
                  Use another cache root:\n    albt --cache-dir /opt/albt cache show")]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// Show the sentinel and whether it is still valid
    Show,

    /// Remove the installed compiler and its sentinel
    Clear,
}
