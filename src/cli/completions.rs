use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    albt completions bash > ~/.bash_completion.d/albt\n\n\
                  Generate zsh completions:\n    albt completions zsh > ~/.zfunc/_albt\n\n\
                  Generate fish completions:\n    albt completions fish > ~/.config/fish/completions/albt.fish\n\n\
                  Generate PowerShell completions:\n    albt completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
