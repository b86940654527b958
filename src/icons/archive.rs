//! Per-run cache of opened mod archives.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{LoadError, Result};

/// Open archives keyed by path, each with an entry name index.
///
/// An archive is opened and indexed the first time one of its entries is
/// requested and stays open until the index is dropped.
#[derive(Default)]
pub struct ArchiveIndex {
    archives: HashMap<PathBuf, IndexedArchive>,
    opened: usize,
}

struct IndexedArchive {
    zip: ZipArchive<BufReader<File>>,
    entries: HashMap<String, usize>,
}

impl IndexedArchive {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| archive_error(path, format!("Failed to open: {}", e)))?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| archive_error(path, format!("Failed to read: {}", e)))?;

        let mut entries = HashMap::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip
                .by_index_raw(index)
                .map_err(|e| archive_error(path, format!("Bad entry #{}: {}", index, e)))?;
            entries.insert(file.name().to_string(), index);
        }

        debug!(archive = %path.display(), entries = entries.len(), "indexed archive");
        Ok(Self { zip, entries })
    }
}

impl ArchiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `entry` inside `archive` for reading.
    pub fn open_entry(&mut self, archive: &Path, entry: &str) -> Result<Box<dyn Read + '_>> {
        let indexed = match self.archives.entry(archive.to_path_buf()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let indexed = IndexedArchive::open(archive)?;
                self.opened += 1;
                slot.insert(indexed)
            }
        };

        let index = *indexed
            .entries
            .get(entry)
            .ok_or_else(|| archive_error(archive, format!("No entry named {}", entry)))?;
        let file = indexed
            .zip
            .by_index(index)
            .map_err(|e| archive_error(archive, format!("Failed to open {}: {}", entry, e)))?;
        Ok(Box::new(file))
    }

    /// Number of distinct archives opened.
    pub fn opened(&self) -> usize {
        self.opened
    }

    pub fn contains(&self, archive: &Path) -> bool {
        self.archives.contains_key(archive)
    }
}

fn archive_error(archive: &Path, message: String) -> LoadError {
    LoadError::Archive {
        archive: archive.to_path_buf(),
        message,
    }
}
