//! Paths command implementation.
//!
//! Resolves the game and mod directories without loading anything.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::error::{LoadError, Result};
use crate::output::Printer;
use crate::paths::{find_game_dir, find_mod_dir, SearchPaths};

use super::LoadArgs;

/// Show the game and mod directories that would be used
#[derive(Args, Debug)]
pub struct PathsArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResolvedPaths {
    game_dir: PathBuf,
    mod_dir: PathBuf,
}

pub fn run(args: PathsArgs, verbose: bool, printer: &Printer) -> Result<()> {
    let config = args.load.to_config(verbose)?;
    let search =
        SearchPaths::for_overrides(config.game_dir.as_deref(), config.mod_dir.as_deref())?;

    let resolved = ResolvedPaths {
        game_dir: find_game_dir(config.game_dir.as_deref(), &search)?,
        mod_dir: find_mod_dir(config.mod_dir.as_deref(), &search)?,
    };

    if args.json {
        println!("{}", to_json(&resolved)?);
    } else {
        printer.info("Game", &printer.path(&resolved.game_dir));
        printer.info("Mods", &printer.path(&resolved.mod_dir));
    }

    Ok(())
}

fn to_json(resolved: &ResolvedPaths) -> Result<String> {
    serde_json::to_string_pretty(resolved).map_err(|e| LoadError::Encode {
        message: format!("Failed to serialize paths: {}", e),
    })
}
