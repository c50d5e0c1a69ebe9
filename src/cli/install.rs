use clap::Parser;
use std::path::PathBuf;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install the overlay from main into the current repository:\n    albt install\n\n\
                   Install a tagged version into another repository:\n    albt install --ref v1.4.0 --dest ../my-app\n\n\
                   Install the latest release and commit it:\n    albt install --latest --commit\n\n\
                   Install from an offline mirror:\n    albt install --remote file:///srv/al-build-tools\n\n\
                   Check prerequisites and provision the compiler too:\n    albt install --prerequisites --auto-install --provision")]
pub struct InstallArgs {
    /// Destination directory inside a git repository (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Tag or branch to install [default: main]
    #[arg(long = "ref", value_name = "REF", conflicts_with = "latest")]
    pub reference: Option<String>,

    /// Install the newest published release instead of a ref
    #[arg(long)]
    pub latest: bool,

    /// Repository publishing the overlay (https://github.com/<owner>/<repo> or file://)
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// Directory inside the archive holding the overlay [default: overlay]
    #[arg(long = "source-subdir", value_name = "NAME")]
    pub source_subdir: Option<String>,

    /// Refuse to install into a working tree with uncommitted changes
    #[arg(long = "require-clean")]
    pub require_clean: bool,

    /// Commit the installed files
    #[arg(long)]
    pub commit: bool,

    /// Commit message (implies --commit)
    #[arg(long = "commit-message", value_name = "MSG")]
    pub commit_message: Option<String>,

    /// Check build prerequisites before installing
    #[arg(long)]
    pub prerequisites: bool,

    /// Install missing prerequisites without asking (implies --prerequisites)
    #[arg(long = "auto-install")]
    pub auto_install: bool,

    /// Provision the AL compiler after installing
    #[arg(long)]
    pub provision: bool,

    /// Business Central runtime to provision for (default: from app.json)
    #[arg(long, value_name = "VERSION")]
    pub runtime: Option<String>,

    /// Exact compiler version to provision
    #[arg(long = "compiler-version", value_name = "VERSION")]
    pub compiler_version: Option<String>,

    /// Append every diagnostic line to this file as well
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_install_defaults() {
        let cli = Cli::try_parse_from(["albt", "install"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert!(args.dest.is_none());
                assert!(args.reference.is_none());
                assert!(!args.latest);
                assert!(!args.commit);
                assert!(!args.provision);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = Cli::try_parse_from([
            "albt",
            "install",
            "--dest",
            "/work/app",
            "--commit-message",
            "tools",
            "--provision",
            "--runtime",
            "16.0",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.dest.unwrap().to_string_lossy(), "/work/app");
                assert_eq!(args.commit_message.as_deref(), Some("tools"));
                assert!(args.provision);
                assert_eq!(args.runtime.as_deref(), Some("16.0"));
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_ref_conflicts_with_latest() {
        let result = Cli::try_parse_from(["albt", "install", "--ref", "main", "--latest"]);
        assert!(result.is_err());
    }
}
