//! Lua implementation of [`ScriptHost`].
//!
//! Each host owns a fresh Lua state. Script bundles are exposed to `require`
//! through extra entries in `package.searchers`, so the loader library and
//! the processing scripts run exactly as they would from disk.

use std::path::Path;
use std::rc::Rc;

use mlua::{Function, Lua, LuaOptions, LuaSerdeExt, RegistryKey, StdLib, Table, Value};
use tracing::{debug, info};

use crate::error::{LoadError, Result};
use crate::icons::IconSource;

use super::{
    LoadRequest, ProcessedData, RecipeMode, ScriptBundle, ScriptBundles, ScriptHost, SpriteMeta,
};

/// Module providing `load_data`.
pub const LOADER_MODULE: &str = "library/factorioloader";

/// Module providing `process_data`.
pub const PROCESS_MODULE: &str = "processdata";

const JSON_INDENT: &str = "    ";

/// Runs the external Lua scripts.
pub struct LuaHost {
    lua: Lua,
    loader: ScriptBundle,
    /// Taken once its searcher is installed.
    process: Option<ScriptBundle>,
    /// Locale table returned by `load_data`, if any.
    locales: Option<RegistryKey>,
    /// Return value of `process_data`.
    processed: Option<RegistryKey>,
}

impl LuaHost {
    pub fn new(bundles: ScriptBundles) -> Self {
        // SAFETY: the scripts are trusted local files, and Factorio's data
        // stage relies on the `debug` library that the safe constructors omit.
        let lua = unsafe { Lua::unsafe_new_with(StdLib::ALL, LuaOptions::default()) };
        Self {
            lua,
            loader: bundles.loader,
            process: Some(bundles.process),
            locales: None,
            processed: None,
        }
    }

    /// Make the process bundle visible to `require` and load its entry
    /// module, which may set up globals such as `JSON`.
    fn require_process(&mut self) -> Result<()> {
        if let Some(bundle) = self.process.take() {
            install_searcher(&self.lua, bundle)?;
        }
        require(&self.lua, PROCESS_MODULE)?;
        Ok(())
    }

    fn processed_table(&self) -> Result<Table<'_>> {
        let key = self
            .processed
            .as_ref()
            .ok_or_else(|| LoadError::Script("process_data has not been run".to_string()))?;
        Ok(self.lua.registry_value(key)?)
    }
}

impl ScriptHost for LuaHost {
    fn load(&mut self, request: &LoadRequest) -> Result<()> {
        install_searcher(&self.lua, std::mem::take(&mut self.loader))?;

        let loader = require(&self.lua, LOADER_MODULE)?;

        if !request.verbose {
            self.lua
                .load("function log(s) end")
                .set_name("=silence_log")
                .exec()?;
        }

        let load_data: Function = loader.get("load_data")?;
        let locales: Value = load_data.call((
            path_arg(&request.game_dir),
            path_arg(&request.mod_dir),
            request.game_version.as_str(),
        ))?;

        self.locales = match locales {
            Value::Nil => None,
            value => Some(self.lua.create_registry_value(value)?),
        };
        info!(game_dir = %request.game_dir.display(), "data loaded");
        Ok(())
    }

    fn raw_json(&mut self) -> Result<String> {
        self.require_process()?;
        let data: Table = self.lua.globals().get("data")?;
        let raw: Value = data.get("raw")?;
        encode_json(&self.lua, raw)
    }

    fn process(&mut self, verbose: bool) -> Result<ProcessedData> {
        self.require_process()?;
        let module = require(&self.lua, PROCESS_MODULE)?;
        let process_data: Function = module.get("process_data")?;

        let globals = self.lua.globals();
        let data: Table = globals.get("data")?;
        let raw: Value = data.get("raw")?;
        let result: Table = match &self.locales {
            Some(key) => {
                let locales: Value = self.lua.registry_value(key)?;
                process_data.call((raw, locales, verbose))?
            }
            None => process_data.call((raw, verbose))?,
        };

        let version: String = result.get("version")?;
        let columns: i64 = result.get("width")?;
        let icon_table: Table = result.get("icons")?;
        let icons = icon_table
            .sequence_values::<Value>()
            .map(|value| self.lua.from_value::<IconSource>(value?))
            .collect::<mlua::Result<Vec<_>>>()?;
        debug!(version = %version, columns, icons = icons.len(), "data processed");

        self.processed = Some(self.lua.create_registry_value(result)?);
        Ok(ProcessedData {
            version,
            columns,
            icons,
        })
    }

    fn annotate_sprites(&mut self, meta: &SpriteMeta) -> Result<()> {
        let result = self.processed_table()?;
        let data: Table = result.get("data")?;
        let sprites: Table = data.get("sprites")?;
        sprites.set("hash", meta.hash.as_str())?;
        sprites.set("width", meta.width)?;
        sprites.set("height", meta.height)?;
        Ok(())
    }

    fn serialize(&mut self, mode: RecipeMode) -> Result<String> {
        let result = self.processed_table()?;
        let data: Table = result.get("data")?;

        // Recipe trees sit next to `data`; older scripts nest them inside it.
        let mut recipes: Value = result.get(mode.key())?;
        if let Value::Nil = recipes {
            recipes = data.get(mode.key())?;
        }
        data.set("recipes", recipes)?;

        encode_json(&self.lua, Value::Table(data))
    }
}

/// Add a `package.searchers` entry resolving modules from `bundle`.
///
/// The entry goes in at position 2, ahead of the filesystem searchers, so a
/// later bundle shadows an earlier one.
fn install_searcher(lua: &Lua, bundle: ScriptBundle) -> mlua::Result<()> {
    let bundle = Rc::new(bundle);
    let searcher = lua.create_function(move |lua, module: String| {
        let path = ScriptBundle::module_path(&module);
        let full_path = format!("{}/{}", bundle.name(), path);

        match bundle.get(&path) {
            Some(source) => {
                let chunk = lua
                    .load(source)
                    .set_name(format!("@{}", full_path))
                    .into_function()?;
                Ok((Value::Function(chunk), Value::String(lua.create_string(&full_path)?)))
            }
            None => {
                let message = format!("\n\tcould not find {}", full_path);
                Ok((Value::String(lua.create_string(&message)?), Value::Nil))
            }
        }
    })?;

    let globals = lua.globals();
    let package: Table = globals.get("package")?;
    let searchers: Table = package.get("searchers")?;
    let table: Table = globals.get("table")?;
    let insert: Function = table.get("insert")?;
    insert.call::<_, ()>((searchers, 2, searcher))
}

fn require<'lua>(lua: &'lua Lua, module: &str) -> mlua::Result<Table<'lua>> {
    let require: Function = lua.globals().get("require")?;
    require.call(module)
}

/// Serialize a value with the scripts' own `JSON` module.
fn encode_json<'lua>(lua: &'lua Lua, value: Value<'lua>) -> Result<String> {
    let json: Table = lua
        .globals()
        .get("JSON")
        .map_err(|_| LoadError::Script("global JSON module is not defined".to_string()))?;
    let encode: Function = json.get("encode")?;

    let options = lua.create_table()?;
    options.set("pretty", true)?;
    options.set("align_keys", false)?;
    options.set("indent", JSON_INDENT)?;

    let text: String = encode.call((json, value, Value::Nil, options))?;
    Ok(text)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
