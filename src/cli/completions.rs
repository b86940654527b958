//! Completion scripts for the `dump` and `paths` commands and their flags.

use std::io::Write;

use clap::{Args, CommandFactory};
use clap_complete::Shell;

use super::Cli;

const BIN_NAME: &str = "factorio-tools";

/// Print a completion script for factorio-tools
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell, e.g. `factorio-tools completions zsh > _factorio-tools`
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> crate::error::Result<()> {
    write_completions(args.shell, &mut std::io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, BIN_NAME, out);
}
