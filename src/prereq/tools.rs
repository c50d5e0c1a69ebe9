//! Required tools and how to install them

use super::probe::Probe;

/// OS package manager used to install the other tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Winget,
    Brew,
    AptGet,
}

impl PackageManager {
    pub fn for_current_os() -> Self {
        if cfg!(windows) {
            Self::Winget
        } else if cfg!(target_os = "macos") {
            Self::Brew
        } else {
            Self::AptGet
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Winget => "winget",
            Self::Brew => "brew",
            Self::AptGet => "apt-get",
        }
    }

    /// Unattended install command for `package`
    pub fn install_command(self, package: &PackageNames) -> Command {
        let (program, args): (&str, Vec<&str>) = match self {
            Self::Winget => (
                "winget",
                vec![
                    "install",
                    "--id",
                    package.winget,
                    "--exact",
                    "--silent",
                    "--accept-source-agreements",
                    "--accept-package-agreements",
                ],
            ),
            Self::Brew => {
                let mut args = vec!["install"];
                if package.brew_cask {
                    args.push("--cask");
                }
                args.push(package.brew);
                ("brew", args)
            }
            Self::AptGet => ("apt-get", vec!["install", "-y", package.apt]),
        };
        Command::new(program, args)
    }

    /// Command that makes the package manager usable, if it can be bootstrapped at all
    pub fn bootstrap_command(self) -> Option<Command> {
        match self {
            // ships with Windows as App Installer
            Self::Winget => None,
            Self::Brew => Some(Command::new(
                "/bin/bash",
                vec![
                    "-c",
                    "NONINTERACTIVE=1 /bin/bash -c \"$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)\"",
                ],
            )),
            Self::AptGet => Some(Command::new("apt-get", vec!["update"])),
        }
    }
}

/// An external command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(program: &str, args: Vec<&str>) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn arg_refs(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }
}

/// Package names of one tool across package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageNames {
    pub winget: &'static str,
    pub brew: &'static str,
    pub brew_cask: bool,
    pub apt: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallMethod {
    /// Bootstrap the package manager itself
    PackageManager,
    /// Install through the package manager
    Package(PackageNames),
    /// `Install-Module` from the PowerShell Gallery
    PwshModule(&'static str),
}

/// One required tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub probe: Probe,
    pub minimum: Option<&'static str>,
    pub install: InstallMethod,
}

impl ToolSpec {
    /// Command that installs this tool, `None` when it cannot be installed automatically
    pub fn install_command(&self, manager: PackageManager) -> Option<Command> {
        match &self.install {
            InstallMethod::PackageManager => manager.bootstrap_command(),
            InstallMethod::Package(names) => Some(manager.install_command(names)),
            InstallMethod::PwshModule(module) => {
                let script = format!(
                    "Set-PSRepository -Name PSGallery -InstallationPolicy Trusted; Install-Module -Name {module} -Scope CurrentUser -Force"
                );
                Some(Command::new(
                    "pwsh",
                    vec!["-NoProfile", "-NonInteractive", "-Command", &script],
                ))
            }
        }
    }
}

/// Every required tool, in install order
///
/// Later entries depend on earlier ones: packages need the package manager and the
/// module needs PowerShell.
pub fn required_tools(manager: PackageManager) -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: manager.program(),
            probe: Probe::Command {
                program: manager.program(),
                args: &["--version"],
            },
            minimum: None,
            install: InstallMethod::PackageManager,
        },
        ToolSpec {
            name: "git",
            probe: Probe::Command {
                program: "git",
                args: &["--version"],
            },
            minimum: Some("2.20"),
            install: InstallMethod::Package(PackageNames {
                winget: "Git.Git",
                brew: "git",
                brew_cask: false,
                apt: "git",
            }),
        },
        ToolSpec {
            name: "pwsh",
            probe: Probe::Command {
                program: "pwsh",
                args: &["--version"],
            },
            minimum: Some("7.2"),
            install: InstallMethod::Package(PackageNames {
                winget: "Microsoft.PowerShell",
                brew: "powershell",
                brew_cask: true,
                apt: "powershell",
            }),
        },
        ToolSpec {
            name: "dotnet",
            probe: Probe::Command {
                program: "dotnet",
                args: &["--version"],
            },
            minimum: Some("8.0"),
            install: InstallMethod::Package(PackageNames {
                winget: "Microsoft.DotNet.SDK.8",
                brew: "dotnet-sdk",
                brew_cask: true,
                apt: "dotnet-sdk-8.0",
            }),
        },
        ToolSpec {
            name: "InvokeBuild",
            probe: Probe::PwshModule("InvokeBuild"),
            minimum: Some("5.10"),
            install: InstallMethod::PwshModule("InvokeBuild"),
        },
    ]
}
