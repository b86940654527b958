//! Load configuration (factorio-tools.yaml).
//!
//! Every setting the pipeline reads lives in [`LoadConfig`], which is passed
//! into [`crate::Pipeline`] explicitly. The optional config file supplies
//! defaults; command-line flags override them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Result};

/// The name of the optional config file.
pub const CONFIG_FILENAME: &str = "factorio-tools.yaml";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Explicit Factorio installation directory. Disables auto-search.
    pub game_dir: Option<PathBuf>,

    /// Explicit user mod directory. Disables auto-search.
    pub mod_dir: Option<PathBuf>,

    /// Let the scripts log and print progress.
    pub verbose: bool,

    /// Write the unprocessed `data.raw` here and stop after loading.
    pub raw_dump: Option<PathBuf>,

    /// Factorio major version passed to the loader ("1" or "2").
    #[serde(default = "default_game_version")]
    pub game_version: String,

    /// Directory holding the loader library scripts.
    #[serde(default = "default_loader_lib")]
    pub loader_lib: PathBuf,

    /// Directory holding the data processing scripts.
    #[serde(default = "default_process_data")]
    pub process_data: PathBuf,
}

fn default_game_version() -> String {
    "2".to_string()
}

fn default_loader_lib() -> PathBuf {
    PathBuf::from("FactorioLoaderLib")
}

fn default_process_data() -> PathBuf {
    PathBuf::from("processdata")
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            game_dir: None,
            mod_dir: None,
            verbose: false,
            raw_dump: None,
            game_version: default_game_version(),
            loader_lib: default_loader_lib(),
            process_data: default_process_data(),
        }
    }
}

impl LoadConfig {
    /// Load config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Load `factorio-tools.yaml` from `dir` if present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| LoadError::Config {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !matches!(self.game_version.as_str(), "1" | "2") {
            return Err(LoadError::Config {
                message: format!("Unsupported game version: {}", self.game_version),
                help: Some("Use \"1\" or \"2\"".to_string()),
            });
        }
        Ok(())
    }
}
