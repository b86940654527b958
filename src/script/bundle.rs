//! Script bundles.
//!
//! A bundle is an in-memory set of script files keyed by their
//! forward-slash relative path (`library/factorioloader.lua`). The Lua host
//! resolves `require` calls against bundles instead of the filesystem.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{LoadError, Result};

/// A named collection of script files.
#[derive(Debug, Clone, Default)]
pub struct ScriptBundle {
    name: String,
    files: BTreeMap<String, Vec<u8>>,
}

impl ScriptBundle {
    /// Create an empty bundle.
    ///
    /// The name prefixes chunk names in Lua error messages.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    /// Read every file below `root` into a bundle.
    pub fn from_dir(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(LoadError::Io {
                path: root.to_path_buf(),
                message: "Script directory not found".to_string(),
            });
        }

        let mut bundle = Self::new(root.display().to_string());

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| LoadError::Io {
                path: root.to_path_buf(),
                message: format!("Failed to scan script directory: {}", e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let content = fs::read(path).map_err(|e| LoadError::Io {
                path: path.to_path_buf(),
                message: format!("Failed to read script: {}", e),
            })?;
            bundle.insert(key, content);
        }

        Ok(bundle)
    }

    /// Add a file, replacing any existing one at the same path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bundle path of the module `require` would load for `module`.
    pub fn module_path(module: &str) -> String {
        format!("{}.lua", module)
    }
}

/// The two bundles the pipeline needs.
#[derive(Debug, Clone, Default)]
pub struct ScriptBundles {
    /// Mod loader library (`library/factorioloader.lua` and its helpers).
    pub loader: ScriptBundle,
    /// Data processing scripts (`processdata.lua`).
    pub process: ScriptBundle,
}

impl ScriptBundles {
    /// Read both bundles from disk.
    pub fn from_dirs(loader: &Path, process: &Path) -> Result<Self> {
        Ok(Self {
            loader: ScriptBundle::from_dir(loader)?,
            process: ScriptBundle::from_dir(process)?,
        })
    }
}
