//! factorio-tools - Factorio data extraction for the calculator
//!
//! A library for locating a Factorio installation, running the data loading
//! scripts against it, and packing every item icon into a single sprite
//! sheet whose hash is recorded in the generated datasets.

pub mod assemble;
pub mod atlas;
pub mod cli;
pub mod config;
pub mod error;
pub mod icons;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod script;

pub use assemble::{assemble, Datasets};
pub use atlas::{pack, Atlas, AtlasBuilder, AtlasGeometry, Sizing, CELL_SIZE};
pub use config::LoadConfig;
pub use error::{DirKind, LoadError, Result};
pub use icons::{ArchiveIndex, IconResolver, IconSource};
pub use paths::{find_game_dir, find_mod_dir, SearchPaths};
pub use pipeline::{build_atlas, load_data, FactorioData, LoadOutcome, Pipeline};
pub use script::{
    LoadRequest, LuaHost, ProcessedData, RecipeMode, ScriptBundle, ScriptBundles, ScriptHost,
    SpriteMeta,
};
