//! `completions <shell>`.

use clap::CommandFactory;
use clap_complete::Shell as Target;

use crate::cli::args::{Cli, CompletionsArgs, Shell};

/// Writes the completion script for the requested shell to stdout.
pub fn run(args: &CompletionsArgs) {
    let target = match args.shell {
        Shell::Bash => Target::Bash,
        Shell::Zsh => Target::Zsh,
        Shell::Fish => Target::Fish,
        Shell::PowerShell => Target::PowerShell,
        Shell::Elvish => Target::Elvish,
    };
    let mut command = Cli::command();
    let name = command.get_name().to_owned();
    clap_complete::generate(target, &mut command, name, &mut std::io::stdout());
}
