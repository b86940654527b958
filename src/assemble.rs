//! Final dataset assembly.
//!
//! Writes the atlas hash and size into the script data object and asks the
//! scripts for one JSON document per recipe mode. The JSON text is passed
//! through untouched.

use crate::atlas::Atlas;
use crate::error::Result;
use crate::script::{RecipeMode, ScriptHost};

/// The two serialized datasets of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasets {
    pub normal: String,
    pub expensive: String,
}

impl Datasets {
    pub fn get(&self, mode: RecipeMode) -> &str {
        match mode {
            RecipeMode::Normal => &self.normal,
            RecipeMode::Expensive => &self.expensive,
        }
    }
}

/// Annotate the data object with `atlas` and serialize both recipe modes.
pub fn assemble<H: ScriptHost + ?Sized>(host: &mut H, atlas: &Atlas) -> Result<Datasets> {
    host.annotate_sprites(&atlas.meta())?;
    let normal = host.serialize(RecipeMode::Normal)?;
    let expensive = host.serialize(RecipeMode::Expensive)?;
    Ok(Datasets { normal, expensive })
}
