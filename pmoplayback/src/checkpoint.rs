//! Persisted id of the item being played.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("checkpoint {path}: {source}")]
pub struct CheckpointError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Single-value store. An empty value means no active item.
pub trait CheckpointStore {
    /// Stored id, `None` when missing or empty
    fn load(&self) -> Result<Option<String>, CheckpointError>;

    fn store(&mut self, id: &str) -> Result<(), CheckpointError>;

    fn clear(&mut self) -> Result<(), CheckpointError> {
        self.store("")
    }
}

/// Checkpoint kept in a text file.
///
/// The value is written to a sibling temporary file then renamed over
/// the checkpoint, so a reader never sees a partial id.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn error(&self, source: io::Error) -> CheckpointError {
        CheckpointError {
            path: self.path.clone(),
            source,
        }
    }
}

impl CheckpointStore for FileCheckpoint {
    fn load(&self) -> Result<Option<String>, CheckpointError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                // a hand-edited file may end with a newline
                let id = content
                    .strip_suffix('\n')
                    .map(|id| id.strip_suffix('\r').unwrap_or(id))
                    .unwrap_or(content.as_str());
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.error(err)),
        }
    }

    fn store(&mut self, id: &str) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let temp = self.temp_path();
        fs::write(&temp, id).map_err(|e| self.error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.error(e))?;
        debug!(path = %self.path.display(), id, "Checkpoint written");
        Ok(())
    }
}
