//! Icon image sources.
//!
//! The processing scripts describe every icon as either a loose file or an
//! entry inside a mod zip. [`IconResolver`] turns those descriptions into
//! readable byte streams, keeping each archive open and indexed for the rest
//! of the run.

mod archive;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoadError, Result};

pub use archive::ArchiveIndex;

/// Where one icon's image bytes live.
///
/// Deserializes from the script record shape
/// `{ source = "file", path = ... }` or
/// `{ source = "zip", zipfile = ..., path = ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum IconSource {
    File {
        path: PathBuf,
    },
    Zip {
        #[serde(rename = "zipfile")]
        archive: PathBuf,
        #[serde(rename = "path")]
        entry: String,
    },
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconSource::File { path } => write!(f, "{}", path.display()),
            IconSource::Zip { archive, entry } => write!(f, "{}:{}", archive.display(), entry),
        }
    }
}

/// Opens icon sources for one pipeline run.
///
/// Archives opened along the way are closed when the resolver is dropped.
#[derive(Default)]
pub struct IconResolver {
    archives: ArchiveIndex,
}

impl IconResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the image bytes behind `source`.
    pub fn open(&mut self, source: &IconSource) -> Result<Box<dyn Read + '_>> {
        match source {
            IconSource::File { path } => {
                debug!(path = %path.display(), "opening icon file");
                let file = File::open(path).map_err(|e| LoadError::Io {
                    path: path.clone(),
                    message: format!("Failed to open icon: {}", e),
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            IconSource::Zip { archive, entry } => self.archives.open_entry(archive, entry),
        }
    }

    /// Read the whole image behind `source`.
    pub fn read(&mut self, source: &IconSource) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.open(source)?
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::Io {
                path: PathBuf::from(source.to_string()),
                message: format!("Failed to read icon: {}", e),
            })?;
        Ok(bytes)
    }

    /// Number of archives opened so far.
    pub fn archives_opened(&self) -> usize {
        self.archives.opened()
    }
}
