pub mod completions;
pub mod dump;
pub mod paths;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::LoadConfig;
use crate::error::Result;

/// factorio-tools - Factorio data extraction for the calculator
#[derive(Parser, Debug)]
#[command(name = "factorio-tools")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print more output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export datasets and the sprite sheet into a calculator checkout
    Dump(dump::DumpArgs),

    /// Show the game and mod directories that would be used
    Paths(paths::PathsArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Options shared by every command that loads game data.
#[derive(Args, Debug, Default)]
pub struct LoadArgs {
    /// Factorio installation directory
    #[arg(long = "gamedir")]
    pub game_dir: Option<PathBuf>,

    /// User mod directory (e.g. ~/.factorio/mods)
    #[arg(long = "moddir")]
    pub mod_dir: Option<PathBuf>,

    /// Write unprocessed data.raw to this file and exit
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// Factorio major version
    #[arg(long = "gamever", value_parser = ["1", "2"])]
    pub game_version: Option<String>,

    /// Directory holding the loader library scripts
    #[arg(long)]
    pub loader_lib: Option<PathBuf>,

    /// Directory holding the data processing scripts
    #[arg(long)]
    pub process_data: Option<PathBuf>,

    /// Config file (default: ./factorio-tools.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl LoadArgs {
    /// Merge flags over the config file.
    pub fn to_config(&self, verbose: bool) -> Result<LoadConfig> {
        let mut config = match &self.config {
            Some(path) => LoadConfig::load(path)?,
            None => LoadConfig::discover(Path::new("."))?,
        };

        if let Some(dir) = &self.game_dir {
            config.game_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.mod_dir {
            config.mod_dir = Some(dir.clone());
        }
        if let Some(path) = &self.raw {
            config.raw_dump = Some(path.clone());
        }
        if let Some(version) = &self.game_version {
            config.game_version = version.clone();
        }
        if let Some(dir) = &self.loader_lib {
            config.loader_lib = dir.clone();
        }
        if let Some(dir) = &self.process_data {
            config.process_data = dir.clone();
        }
        config.verbose |= verbose;

        Ok(config)
    }
}
