//! Locating the Factorio installation and the user mod directory.
//!
//! Both lookups work the same way: an explicit override is checked against a
//! marker file and used as-is, otherwise an ordered list of candidates is
//! tried and the first valid one wins.
//!
//! # Example
//!
//! ```ignore
//! use factorio_tools::paths::{find_game_dir, SearchPaths};
//!
//! let search = SearchPaths::detect()?;
//! let game_dir = find_game_dir(None, &search)?;
//! ```

mod platform;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DirKind, LoadError, Result};

/// File that must exist inside a game directory.
pub const GAME_MARKER: &str = "data/core/info.json";

/// File that must exist inside a mod directory.
pub const MOD_MARKER: &str = "mod-list.json";

/// Ordered search locations.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    /// Locations checked for both directories, highest priority first:
    /// the executable's directory, its parent and the working directory.
    pub anchors: Vec<PathBuf>,
    /// Platform-specific game install locations.
    pub game: Vec<PathBuf>,
    /// Platform-specific user data locations.
    pub data: Vec<PathBuf>,
}

impl SearchPaths {
    /// Build the search list for the running process and platform.
    pub fn detect() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let mut anchors = Vec::new();
        if let Some(bin_dir) = exe.parent() {
            anchors.push(bin_dir.to_path_buf());
            if let Some(parent) = bin_dir.parent() {
                anchors.push(parent.to_path_buf());
            }
        }
        anchors.push(PathBuf::from("."));

        Ok(Self {
            anchors,
            game: platform::game_dirs(),
            data: platform::data_dirs(),
        })
    }

    /// Search list needed to resolve the given overrides.
    ///
    /// When both directories are overridden nothing is searched, so the
    /// running process is not inspected and the list is empty.
    pub fn for_overrides(game_dir: Option<&Path>, mod_dir: Option<&Path>) -> Result<Self> {
        if game_dir.is_some() && mod_dir.is_some() {
            return Ok(Self::default());
        }
        Self::detect()
    }

    /// Candidates for the game directory, in priority order.
    pub fn game_candidates(&self) -> Vec<PathBuf> {
        self.anchors.iter().chain(&self.game).cloned().collect()
    }

    /// Candidates for the mod directory, in priority order.
    ///
    /// Each location contributes its `mods` subdirectory first, then itself.
    pub fn mod_candidates(&self) -> Vec<PathBuf> {
        self.anchors
            .iter()
            .chain(&self.data)
            .flat_map(|dir| [dir.join("mods"), dir.clone()])
            .collect()
    }
}

/// Check whether `path` looks like a Factorio installation.
pub fn is_game_dir(path: &Path) -> bool {
    path.join(GAME_MARKER).is_file()
}

/// Check whether `path` looks like a mod directory.
pub fn is_mod_dir(path: &Path) -> bool {
    path.join(MOD_MARKER).is_file()
}

/// Find the game directory.
///
/// With an override, the override is the only candidate.
pub fn find_game_dir(override_dir: Option<&Path>, search: &SearchPaths) -> Result<PathBuf> {
    resolve(
        DirKind::Game,
        GAME_MARKER,
        override_dir,
        search.game_candidates(),
        is_game_dir,
    )
}

/// Find the user mod directory.
///
/// With an override, the override is the only candidate.
pub fn find_mod_dir(override_dir: Option<&Path>, search: &SearchPaths) -> Result<PathBuf> {
    resolve(
        DirKind::Mod,
        MOD_MARKER,
        override_dir,
        search.mod_candidates(),
        is_mod_dir,
    )
}

fn resolve(
    kind: DirKind,
    marker: &'static str,
    override_dir: Option<&Path>,
    candidates: Vec<PathBuf>,
    is_valid: fn(&Path) -> bool,
) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        if !is_valid(dir) {
            return Err(LoadError::InvalidDirectory {
                kind,
                path: dir.to_path_buf(),
                marker,
            });
        }
        return Ok(dir.to_path_buf());
    }

    for candidate in &candidates {
        if is_valid(candidate) {
            debug!(%kind, path = %candidate.display(), "found directory");
            return Ok(candidate.clone());
        }
    }

    Err(LoadError::NotFound {
        kind,
        searched: candidates,
    })
}
