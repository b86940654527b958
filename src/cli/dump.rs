//! Dump command implementation.
//!
//! Loads the game data and writes the sprite sheet and both datasets into a
//! calculator checkout.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::error::{LoadError, Result};
use crate::output::Printer;
use crate::pipeline::{load_data, FactorioData, LoadOutcome};
use crate::script::RecipeMode;

use super::LoadArgs;

/// File that marks a calculator checkout.
const CALC_MARKER: &str = "calc.html";

/// Export datasets and the sprite sheet into a calculator checkout
#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub load: LoadArgs,

    /// Calculator development directory
    #[arg(long = "calcdir", default_value = ".")]
    pub calc_dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,

    /// Prefix to use for data files
    #[arg(long, default_value = "vanilla")]
    pub prefix: String,
}

pub fn run(args: DumpArgs, verbose: bool, printer: &Printer) -> Result<()> {
    if !args.calc_dir.join(CALC_MARKER).is_file() {
        return Err(LoadError::Config {
            message: format!("Invalid calculator directory: {}", args.calc_dir.display()),
            help: Some(format!("The directory must contain {}", CALC_MARKER)),
        });
    }

    let config = args.load.to_config(verbose)?;
    printer.status("Loading", &format!("game data (Factorio {})", config.game_version));

    let data = match load_data(&config)? {
        LoadOutcome::Data(data) => data,
        LoadOutcome::RawDumped(path) => {
            printer.status("Wrote", &format!("raw data to {}", printer.path(&path)));
            return Ok(());
        }
    };

    let outputs = output_files(&args.calc_dir, &args.prefix, &data);
    for (path, _) in &outputs {
        check_path(path, args.force, printer)?;
    }
    for (path, content) in &outputs {
        write_file(path, content)?;
        printer.status("Created", &printer.path(path));
    }

    Ok(())
}

/// Destination paths and contents, sprite sheet first.
fn output_files<'a>(calc_dir: &Path, prefix: &str, data: &'a FactorioData) -> Vec<(PathBuf, &'a [u8])> {
    let data_dir = calc_dir.join("data");
    vec![
        (
            calc_dir.join("images").join(data.sprite_file_name()),
            data.sprite_sheet.as_slice(),
        ),
        (
            data_dir.join(data.dataset_file_name(prefix, RecipeMode::Normal)),
            data.normal.as_bytes(),
        ),
        (
            data_dir.join(data.dataset_file_name(prefix, RecipeMode::Expensive)),
            data.expensive.as_bytes(),
        ),
    ]
}

fn check_path(path: &Path, force: bool, printer: &Printer) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if force {
        printer.warning("Replacing", &printer.path(path));
        return Ok(());
    }
    Err(LoadError::Io {
        path: path.to_path_buf(),
        message: "File already exists (use --force to overwrite)".to_string(),
    })
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LoadError::Io {
            path: parent.to_path_buf(),
            message: format!("Failed to create directory: {}", e),
        })?;
    }
    fs::write(path, content).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write file: {}", e),
    })
}
