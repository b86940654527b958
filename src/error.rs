use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for data loading operations
#[derive(Error, Diagnostic, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    #[diagnostic(code(factorio_tools::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(factorio_tools::io))]
    Io { path: PathBuf, message: String },

    #[error("Factorio {kind} directory not found (searched: {})", join_paths(.searched))]
    #[diagnostic(
        code(factorio_tools::paths),
        help("Pass the directory explicitly with --gamedir or --moddir")
    )]
    NotFound {
        kind: DirKind,
        searched: Vec<PathBuf>,
    },

    #[error("Invalid {kind} directory: {path} (missing {marker})")]
    #[diagnostic(code(factorio_tools::paths))]
    InvalidDirectory {
        kind: DirKind,
        path: PathBuf,
        marker: &'static str,
    },

    #[error("Script error: {0}")]
    #[diagnostic(code(factorio_tools::script))]
    Script(String),

    #[error("Failed to decode icon {path}: {message}")]
    #[diagnostic(code(factorio_tools::decode))]
    Decode { path: String, message: String },

    #[error("Archive error with {archive}: {message}")]
    #[diagnostic(code(factorio_tools::archive))]
    Archive { archive: PathBuf, message: String },

    #[error("Atlas error: {message}")]
    #[diagnostic(code(factorio_tools::atlas))]
    Atlas { message: String },

    #[error("Failed to encode sprite sheet: {message}")]
    #[diagnostic(code(factorio_tools::encode))]
    Encode { message: String },

    #[error("Config error: {message}")]
    #[diagnostic(code(factorio_tools::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },
}

/// Which of the two searched directories an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    Game,
    Mod,
}

impl std::fmt::Display for DirKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirKind::Game => f.write_str("game"),
            DirKind::Mod => f.write_str("mod"),
        }
    }
}

impl From<mlua::Error> for LoadError {
    fn from(err: mlua::Error) -> Self {
        LoadError::Script(err.to_string())
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, LoadError>;
