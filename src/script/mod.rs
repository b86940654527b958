//! The boundary between the pipeline and the game data scripts.
//!
//! The pipeline never touches script values directly. It drives a
//! [`ScriptHost`] through a fixed sequence of calls and exchanges plain
//! records with it:
//!
//! 1. [`ScriptHost::load`] loads the game and mods and merges the raw
//!    prototype definitions.
//! 2. [`ScriptHost::process`] turns them into the calculator data object and
//!    reports the icon list and atlas column count.
//! 3. [`ScriptHost::annotate_sprites`] stores the atlas hash and size in the
//!    data object.
//! 4. [`ScriptHost::serialize`] renders the data object as JSON, once per
//!    recipe mode.
//!
//! [`LuaHost`] runs the external Lua scripts; tests use in-memory hosts.

mod bundle;
mod lua;

use std::path::PathBuf;

use crate::error::Result;
use crate::icons::IconSource;

pub use bundle::{ScriptBundle, ScriptBundles};
pub use lua::{LuaHost, LOADER_MODULE, PROCESS_MODULE};

/// Arguments of the load phase.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub game_dir: PathBuf,
    pub mod_dir: PathBuf,
    /// Factorio major version selector ("1" or "2").
    pub game_version: String,
    /// When false, the scripts' `log` function is replaced by a no-op.
    pub verbose: bool,
}

/// What the process phase reports back to the host side.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedData {
    /// Factorio version string, e.g. "2.0.28".
    pub version: String,
    /// Number of atlas columns.
    pub columns: i64,
    /// Icon sources in atlas order.
    pub icons: Vec<IconSource>,
}

/// Atlas metadata written back into the data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteMeta {
    pub hash: String,
    pub width: u32,
    pub height: u32,
}

/// The two recipe variants of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeMode {
    Normal,
    Expensive,
}

impl RecipeMode {
    pub const ALL: [RecipeMode; 2] = [RecipeMode::Normal, RecipeMode::Expensive];

    /// Field holding this mode's recipe tree.
    pub fn key(self) -> &'static str {
        match self {
            RecipeMode::Normal => "normal",
            RecipeMode::Expensive => "expensive",
        }
    }
}

/// A script engine able to run the load/process contract.
///
/// Calls must follow the order documented at module level; `raw_json` is
/// only meaningful between `load` and `process`.
pub trait ScriptHost {
    fn load(&mut self, request: &LoadRequest) -> Result<()>;

    /// Serialized `data.raw` as produced by the load phase.
    ///
    /// The processing scripts are loaded first, since they may provide the
    /// serializer, but nothing is processed.
    fn raw_json(&mut self) -> Result<String>;

    fn process(&mut self, verbose: bool) -> Result<ProcessedData>;

    fn annotate_sprites(&mut self, meta: &SpriteMeta) -> Result<()>;

    /// Serialize the data object with `mode`'s recipes attached.
    fn serialize(&mut self, mode: RecipeMode) -> Result<String>;
}

impl<H: ScriptHost + ?Sized> ScriptHost for &mut H {
    fn load(&mut self, request: &LoadRequest) -> Result<()> {
        (**self).load(request)
    }

    fn raw_json(&mut self) -> Result<String> {
        (**self).raw_json()
    }

    fn process(&mut self, verbose: bool) -> Result<ProcessedData> {
        (**self).process(verbose)
    }

    fn annotate_sprites(&mut self, meta: &SpriteMeta) -> Result<()> {
        (**self).annotate_sprites(meta)
    }

    fn serialize(&mut self, mode: RecipeMode) -> Result<String> {
        (**self).serialize(mode)
    }
}
