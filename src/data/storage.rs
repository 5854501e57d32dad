//! JSON state file holding the accumulated traffic history.
//!
//! The file is read once when a run starts and rewritten once when it ends.
//! A missing file means "no history yet"; anything else that prevents reading
//! it is reported, since writing an empty store over it would lose history.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::models::Store;

/// State file errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read state file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("state file {path:?} is not valid traffic JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize traffic state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write state file {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Location of the persisted traffic history
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        StateFile { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored history, or an empty store if the file does not exist yet
    pub fn load(&self) -> StoreResult<Store> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(Store::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Store::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the state file with `store`, indented with four spaces.
    ///
    /// The document goes to a temporary file in the same directory and is
    /// persisted over the target, so an interrupted write leaves the previous
    /// history untouched. The temporary file is removed if anything fails.
    pub fn save(&self, store: &Store) -> StoreResult<()> {
        let bytes = to_pretty_json(store)?;

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(self.dir()).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        tracing::debug!(path = %self.path.display(), repos = store.len(), "state file written");
        Ok(())
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}
