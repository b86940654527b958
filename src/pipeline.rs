//! One data extraction run, start to finish.
//!
//! ```ignore
//! use factorio_tools::{load_data, LoadConfig, LoadOutcome};
//!
//! match load_data(&LoadConfig::default())? {
//!     LoadOutcome::Data(data) => println!("{}", data.sprite_file_name()),
//!     LoadOutcome::RawDumped(path) => println!("wrote {}", path.display()),
//! }
//! ```

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::assemble::assemble;
use crate::atlas::{decode_icon, Atlas, AtlasBuilder, AtlasGeometry};
use crate::config::LoadConfig;
use crate::error::{LoadError, Result};
use crate::icons::{IconResolver, IconSource};
use crate::paths::{find_game_dir, find_mod_dir, SearchPaths};
use crate::script::{LoadRequest, LuaHost, RecipeMode, ScriptBundles, ScriptHost};

/// Everything the calculator needs from one game installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorioData {
    /// Dataset with normal-mode recipes.
    pub normal: String,
    /// Dataset with expensive-mode recipes.
    pub expensive: String,
    /// PNG sprite sheet.
    pub sprite_sheet: Vec<u8>,
    /// Hash of `sprite_sheet`, as stored in both datasets.
    pub sprite_hash: String,
    /// Factorio version number.
    pub version: String,
}

impl FactorioData {
    pub fn dataset(&self, mode: RecipeMode) -> &str {
        match mode {
            RecipeMode::Normal => &self.normal,
            RecipeMode::Expensive => &self.expensive,
        }
    }

    /// `sprite-sheet-<hash>.png`
    pub fn sprite_file_name(&self) -> String {
        format!("sprite-sheet-{}.png", self.sprite_hash)
    }

    /// `<prefix>-<version>.json` or `<prefix>-<version>-expensive.json`
    pub fn dataset_file_name(&self, prefix: &str, mode: RecipeMode) -> String {
        match mode {
            RecipeMode::Normal => format!("{}-{}.json", prefix, self.version),
            RecipeMode::Expensive => format!("{}-{}-expensive.json", prefix, self.version),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Data(FactorioData),
    /// Raw dump requested: `data.raw` was written here and processing skipped.
    RawDumped(PathBuf),
}

/// A single extraction run over one script host.
pub struct Pipeline<H> {
    config: LoadConfig,
    host: H,
    /// `None` until a directory actually has to be searched for.
    search: Option<SearchPaths>,
}

impl Pipeline<LuaHost> {
    /// Pipeline over a fresh Lua state, searching the usual locations.
    pub fn new(config: LoadConfig, bundles: ScriptBundles) -> Self {
        Self {
            config,
            host: LuaHost::new(bundles),
            search: None,
        }
    }
}

impl<H: ScriptHost> Pipeline<H> {
    pub fn with_host(config: LoadConfig, host: H, search: SearchPaths) -> Self {
        Self {
            config,
            host,
            search: Some(search),
        }
    }

    /// Search locations for this run.
    ///
    /// Detection is skipped when both directories are overridden.
    fn search_paths(&mut self) -> Result<SearchPaths> {
        if let Some(search) = self.search.take() {
            return Ok(search);
        }
        SearchPaths::for_overrides(
            self.config.game_dir.as_deref(),
            self.config.mod_dir.as_deref(),
        )
    }

    /// Run every stage in order. Any error ends the run.
    pub fn run(mut self) -> Result<LoadOutcome> {
        let search = self.search_paths()?;
        let game_dir = find_game_dir(self.config.game_dir.as_deref(), &search)?;
        let mod_dir = find_mod_dir(self.config.mod_dir.as_deref(), &search)?;
        info!(game_dir = %game_dir.display(), mod_dir = %mod_dir.display(), "using directories");

        self.host.load(&LoadRequest {
            game_dir,
            mod_dir,
            game_version: self.config.game_version.clone(),
            verbose: self.config.verbose,
        })?;

        if let Some(path) = &self.config.raw_dump {
            let raw = self.host.raw_json()?;
            fs::write(path, raw).map_err(|e| LoadError::Io {
                path: path.clone(),
                message: format!("Failed to write raw data: {}", e),
            })?;
            info!(path = %path.display(), "wrote raw data");
            return Ok(LoadOutcome::RawDumped(path.clone()));
        }

        let processed = self.host.process(self.config.verbose)?;
        let atlas = build_atlas(&processed.icons, processed.columns)?;
        let datasets = assemble(&mut self.host, &atlas)?;

        Ok(LoadOutcome::Data(FactorioData {
            normal: datasets.normal,
            expensive: datasets.expensive,
            sprite_sheet: atlas.png,
            sprite_hash: atlas.hash,
            version: processed.version,
        }))
    }
}

/// Resolve, decode and pack `icons` into a sprite sheet.
///
/// Archives opened for the icons are closed before this returns.
pub fn build_atlas(icons: &[IconSource], columns: i64) -> Result<Atlas> {
    let mut builder = AtlasBuilder::new(AtlasGeometry::new(icons.len(), columns)?);
    let mut resolver = IconResolver::new();

    for (index, source) in icons.iter().enumerate() {
        let bytes = resolver.read(source)?;
        let icon = decode_icon(&bytes, source)?;
        let sizing = builder.place(index, &icon)?;
        debug!(index, source = %source, ?sizing, "placed icon");
    }

    debug!(
        icons = icons.len(),
        archives = resolver.archives_opened(),
        "resolved icons"
    );
    builder.finish()
}

/// Run the Lua pipeline with the bundles named in `config`.
pub fn load_data(config: &LoadConfig) -> Result<LoadOutcome> {
    let bundles = ScriptBundles::from_dirs(&config.loader_lib, &config.process_data)?;
    Pipeline::new(config.clone(), bundles).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::content_hash;
    use crate::paths::{GAME_MARKER, MOD_MARKER};
    use crate::script::{ProcessedData, ScriptBundle, SpriteMeta};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    struct Install {
        root: TempDir,
    }

    impl Install {
        fn new() -> Self {
            let root = tempdir().unwrap();
            fs::create_dir_all(root.path().join("game/data/core")).unwrap();
            fs::write(root.path().join("game").join(GAME_MARKER), "{}").unwrap();
            fs::create_dir_all(root.path().join("mods")).unwrap();
            fs::write(root.path().join("mods").join(MOD_MARKER), "{\"mods\":[]}").unwrap();
            Self { root }
        }

        fn game_dir(&self) -> PathBuf {
            self.root.path().join("game")
        }

        fn mod_dir(&self) -> PathBuf {
            self.root.path().join("mods")
        }

        fn config(&self) -> LoadConfig {
            LoadConfig {
                game_dir: Some(self.game_dir()),
                mod_dir: Some(self.mod_dir()),
                ..LoadConfig::default()
            }
        }
    }

    fn png_bytes(width: u32, height: u32, colour: [u8; 4]) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(colour)));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    /// Host returning canned data and recording the calls it receives.
    #[derive(Default)]
    struct FakeHost {
        processed: Option<ProcessedData>,
        calls: Vec<&'static str>,
        request: Option<LoadRequest>,
        sprites: Option<SpriteMeta>,
    }

    impl ScriptHost for FakeHost {
        fn load(&mut self, request: &LoadRequest) -> Result<()> {
            self.calls.push("load");
            self.request = Some(request.clone());
            Ok(())
        }

        fn raw_json(&mut self) -> Result<String> {
            self.calls.push("raw_json");
            Ok("{\"item\": {}}".to_string())
        }

        fn process(&mut self, _verbose: bool) -> Result<ProcessedData> {
            self.calls.push("process");
            self.processed
                .clone()
                .ok_or_else(|| LoadError::Script("no data".to_string()))
        }

        fn annotate_sprites(&mut self, meta: &SpriteMeta) -> Result<()> {
            self.calls.push("annotate_sprites");
            self.sprites = Some(meta.clone());
            Ok(())
        }

        fn serialize(&mut self, mode: RecipeMode) -> Result<String> {
            self.calls.push("serialize");
            let hash = self.sprites.as_ref().map(|s| s.hash.clone()).unwrap_or_default();
            Ok(format!("{{\"mode\":\"{}\",\"hash\":\"{}\"}}", mode.key(), hash))
        }
    }

    fn no_search() -> SearchPaths {
        SearchPaths::default()
    }

    #[test]
    fn test_run_with_fake_host() {
        let install = Install::new();
        let icon = install.game_dir().join("gear.png");
        fs::write(&icon, png_bytes(32, 32, [1, 2, 3, 255])).unwrap();
        let archive = install.mod_dir().join("pack_1.0.0.zip");
        write_zip(
            &archive,
            &[
                ("pack_1.0.0/a.png", png_bytes(64, 64, [0, 255, 0, 255])),
                ("pack_1.0.0/b.png", png_bytes(120, 64, [0, 0, 255, 255])),
            ],
        );

        let mut host = FakeHost {
            processed: Some(ProcessedData {
                version: "2.0.28".to_string(),
                columns: 2,
                icons: vec![
                    IconSource::File { path: icon },
                    IconSource::Zip {
                        archive: archive.clone(),
                        entry: "pack_1.0.0/a.png".to_string(),
                    },
                    IconSource::Zip {
                        archive,
                        entry: "pack_1.0.0/b.png".to_string(),
                    },
                ],
            }),
            ..FakeHost::default()
        };

        let outcome = Pipeline::with_host(install.config(), &mut host, no_search())
            .run()
            .unwrap();
        let LoadOutcome::Data(data) = outcome else {
            panic!("expected data");
        };

        assert_eq!(
            host.calls,
            vec!["load", "process", "annotate_sprites", "serialize", "serialize"]
        );
        let request = host.request.as_ref().unwrap();
        assert_eq!(request.game_dir, install.game_dir());
        assert_eq!(request.mod_dir, install.mod_dir());
        assert_eq!(request.game_version, "2");

        assert_eq!(data.version, "2.0.28");
        assert_eq!(data.sprite_hash, content_hash(&data.sprite_sheet));
        assert_eq!(
            data.normal,
            format!("{{\"mode\":\"normal\",\"hash\":\"{}\"}}", data.sprite_hash)
        );
        assert_eq!(data.dataset(RecipeMode::Expensive), data.expensive);

        let sheet = image::load_from_memory(&data.sprite_sheet).unwrap().to_rgba8();
        assert_eq!((sheet.width(), sheet.height()), (64, 64));
        assert_eq!(sheet.get_pixel(0, 0).0, [1, 2, 3, 255]);
        assert_eq!(sheet.get_pixel(32, 0).0, [0, 255, 0, 255]);
        assert_eq!(sheet.get_pixel(0, 32).0, [0, 0, 255, 255]);
        assert_eq!(sheet.get_pixel(32, 32).0, [0, 0, 0, 0]);
        assert_eq!(
            host.sprites,
            Some(SpriteMeta {
                hash: data.sprite_hash.clone(),
                width: 64,
                height: 64,
            })
        );
    }

    #[test]
    fn test_raw_dump_stops_after_load() {
        let install = Install::new();
        let raw_path = install.root.path().join("raw.json");
        let config = LoadConfig {
            raw_dump: Some(raw_path.clone()),
            ..install.config()
        };

        let mut host = FakeHost::default();
        let outcome = Pipeline::with_host(config, &mut host, no_search())
            .run()
            .unwrap();

        assert_eq!(outcome, LoadOutcome::RawDumped(raw_path.clone()));
        assert_eq!(host.calls, vec!["load", "raw_json"]);
        assert_eq!(fs::read_to_string(raw_path).unwrap(), "{\"item\": {}}");
    }

    #[test]
    fn test_overrides_skip_search_detection() {
        let install = Install::new();
        let mut pipeline = Pipeline {
            config: install.config(),
            host: FakeHost::default(),
            search: None,
        };

        let search = pipeline.search_paths().unwrap();

        assert!(search.anchors.is_empty());
        assert!(search.game.is_empty());
        assert!(search.data.is_empty());
    }

    #[test]
    fn test_invalid_override_fails_before_load() {
        let install = Install::new();
        let config = LoadConfig {
            game_dir: Some(install.mod_dir()),
            ..install.config()
        };

        let mut host = FakeHost::default();
        let err = Pipeline::with_host(config, &mut host, no_search())
            .run()
            .unwrap_err();

        assert!(matches!(err, LoadError::InvalidDirectory { .. }));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_missing_icon_aborts_run() {
        let install = Install::new();
        let mut host = FakeHost {
            processed: Some(ProcessedData {
                version: "2.0.28".to_string(),
                columns: 4,
                icons: vec![IconSource::File {
                    path: install.game_dir().join("missing.png"),
                }],
            }),
            ..FakeHost::default()
        };

        let err = Pipeline::with_host(install.config(), &mut host, no_search())
            .run()
            .unwrap_err();

        assert!(matches!(err, LoadError::Io { .. }));
        assert!(!host.calls.contains(&"serialize"));
    }

    #[test]
    fn test_build_atlas_is_reproducible() {
        let dir = tempdir().unwrap();
        let icons: Vec<IconSource> = (0..5u8)
            .map(|i| {
                let path = dir.path().join(format!("{}.png", i));
                fs::write(&path, png_bytes(32, 32, [i * 40, 0, 0, 255])).unwrap();
                IconSource::File { path }
            })
            .collect();

        let first = build_atlas(&icons, 3).unwrap();
        let second = build_atlas(&icons, 3).unwrap();

        assert_eq!(first.hash, second.hash);
        assert_eq!((first.width, first.height), (96, 64));
    }

    #[test]
    fn test_file_names() {
        let data = FactorioData {
            normal: String::new(),
            expensive: String::new(),
            sprite_sheet: Vec::new(),
            sprite_hash: "abc".to_string(),
            version: "2.0.28".to_string(),
        };

        assert_eq!(data.sprite_file_name(), "sprite-sheet-abc.png");
        assert_eq!(
            data.dataset_file_name("vanilla", RecipeMode::Normal),
            "vanilla-2.0.28.json"
        );
        assert_eq!(
            data.dataset_file_name("vanilla", RecipeMode::Expensive),
            "vanilla-2.0.28-expensive.json"
        );
    }

    const JSON_LUA: &str = r#"
local JSON = {}
local function encode(value)
    if type(value) == "table" then
        local entries = {}
        for k, v in pairs(value) do entries[#entries + 1] = { tostring(k), v } end
        table.sort(entries, function(a, b) return a[1] < b[1] end)
        local parts = {}
        for _, e in ipairs(entries) do
            parts[#parts + 1] = string.format("%q:%s", e[1], encode(e[2]))
        end
        return "{" .. table.concat(parts, ",") .. "}"
    elseif type(value) == "string" then
        return string.format("%q", value)
    end
    return tostring(value)
end
function JSON:encode(value, etc, options) return encode(value) end
return JSON
"#;

    const LOADER_LUA: &str = r#"
JSON = require("JSON")
return {
    load_data = function(game_dir, mod_dir, version)
        data = { raw = { dirs = { game = game_dir, mods = mod_dir } } }
    end,
}
"#;

    const PROCESS_LUA: &str = r#"
return {
    process_data = function(raw, verbose)
        local dirs = raw.dirs
        return {
            version = "1.1.110",
            width = 3,
            icons = {
                { source = "file", path = dirs.game .. "/a.png" },
                { source = "zip", zipfile = dirs.mods .. "/pack.zip", path = "pack/b.png" },
                { source = "zip", zipfile = dirs.mods .. "/pack.zip", path = "pack/c.png" },
                { source = "file", path = dirs.game .. "/a.png" },
                { source = "file", path = dirs.game .. "/d.png" },
            },
            data = { sprites = {} },
            normal = { plate = "1" },
            expensive = { plate = "2" },
        }
    end,
}
"#;

    #[test]
    fn test_lua_end_to_end() {
        let install = Install::new();
        fs::write(install.game_dir().join("a.png"), png_bytes(32, 32, [200, 0, 0, 255])).unwrap();
        fs::write(install.game_dir().join("d.png"), png_bytes(32, 32, [0, 0, 200, 255])).unwrap();
        write_zip(
            &install.mod_dir().join("pack.zip"),
            &[
                ("pack/b.png", png_bytes(64, 64, [0, 200, 0, 255])),
                ("pack/c.png", png_bytes(120, 64, [9, 9, 9, 255])),
            ],
        );

        let bundles = ScriptBundles {
            loader: ScriptBundle::new("FactorioLoaderLib")
                .with_file("JSON.lua", JSON_LUA)
                .with_file("library/factorioloader.lua", LOADER_LUA),
            process: ScriptBundle::new("processdata").with_file("processdata.lua", PROCESS_LUA),
        };
        let outcome =
            Pipeline::with_host(install.config(), LuaHost::new(bundles), no_search())
                .run()
                .unwrap();
        let LoadOutcome::Data(data) = outcome else {
            panic!("expected data");
        };

        assert_eq!(data.version, "1.1.110");

        let normal: serde_json::Value = serde_json::from_str(&data.normal).unwrap();
        let expensive: serde_json::Value = serde_json::from_str(&data.expensive).unwrap();
        assert_eq!(normal["sprites"]["hash"], data.sprite_hash.as_str());
        assert_eq!(normal["sprites"]["width"], 96);
        assert_eq!(normal["sprites"]["height"], 64);
        assert_eq!(normal["recipes"]["plate"], "1");
        assert_eq!(expensive["recipes"]["plate"], "2");
        assert_eq!(normal["sprites"], expensive["sprites"]);

        let sheet = image::load_from_memory(&data.sprite_sheet).unwrap().to_rgba8();
        assert_eq!((sheet.width(), sheet.height()), (96, 64));
        assert_eq!(sheet.get_pixel(1, 1).0, [200, 0, 0, 255]);
        assert_eq!(sheet.get_pixel(33, 1).0, [0, 200, 0, 255]);
        assert_eq!(sheet.get_pixel(65, 1).0, [9, 9, 9, 255]);
        assert_eq!(sheet.get_pixel(1, 33).0, [200, 0, 0, 255]);
        assert_eq!(sheet.get_pixel(33, 33).0, [0, 0, 200, 255]);
        assert_eq!(sheet.get_pixel(65, 33).0, [0, 0, 0, 0]);
    }
}
