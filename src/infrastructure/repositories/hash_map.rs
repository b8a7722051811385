//! JSON Hash-Map Repository
//!
//! Persists `DependencyHashMap` as `<output>/<route-id>/hash-map.json`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::DependencyHashMap;
use crate::domain::ports::file_system::{FileSystem, FsError};
use crate::domain::value_objects::ContentHash;
use crate::infrastructure::write_guard::{WriteGuard, WriteOutcome};

/// Hash-map persistence errors
#[derive(Debug, Error)]
pub enum HashMapError {
    /// Stored file is not a valid hash map
    #[error("invalid hash map {}: {message}", .path.display())]
    InvalidFormat { path: PathBuf, message: String },
    /// Underlying file system failure
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// JSON representation of a hash map
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonHashMap {
    file: String,
    hash: String,
    #[serde(default)]
    deps: BTreeMap<String, String>,
}

/// Hash-map repository backed by JSON files
///
/// Reads go straight to the file system; writes go through the shared
/// `WriteGuard` so an unchanged map never touches disk.
pub struct JsonHashMapRepository {
    fs: Arc<dyn FileSystem>,
    guard: Arc<WriteGuard>,
}

impl JsonHashMapRepository {
    pub fn new(fs: Arc<dyn FileSystem>, guard: Arc<WriteGuard>) -> Self {
        Self { fs, guard }
    }

    pub fn load(&self, path: &Path) -> Result<DependencyHashMap, HashMapError> {
        let content = self.fs.read(path)?;
        let stored: JsonHashMap =
            serde_json::from_str(&content).map_err(|e| HashMapError::InvalidFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let deps = stored
            .deps
            .into_iter()
            .map(|(dep, hash)| (dep, ContentHash::new(&hash)))
            .collect();
        Ok(DependencyHashMap::from_parts(stored.file, stored.hash, deps))
    }

    /// Load the map, treating a missing or corrupt file as a placeholder.
    pub fn load_or_placeholder(&self, path: &Path, file: &str) -> DependencyHashMap {
        match self.load(path) {
            Ok(map) => map,
            Err(HashMapError::Fs(e)) if e.is_not_found() => DependencyHashMap::placeholder(file),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable hash map, treating route as stale");
                DependencyHashMap::placeholder(file)
            }
        }
    }

    pub fn save(&self, map: &DependencyHashMap, path: &Path) -> Result<WriteOutcome, HashMapError> {
        let stored = JsonHashMap {
            file: map.file().to_string(),
            hash: map.hash().to_string(),
            deps: map
                .deps()
                .iter()
                .map(|(dep, hash)| (dep.clone(), hash.to_string()))
                .collect(),
        };
        let mut content =
            serde_json::to_string_pretty(&stored).map_err(|e| HashMapError::InvalidFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        content.push('\n');
        Ok(self.guard.write(path, &content)?)
    }

    /// Write a placeholder map unless one already exists.
    ///
    /// Returns whether a placeholder was written.
    pub fn ensure_placeholder(&self, path: &Path, file: &str) -> Result<bool, HashMapError> {
        if self.fs.exists(path) {
            return Ok(false);
        }
        self.save(&DependencyHashMap::placeholder(file), path)?;
        Ok(true)
    }
}
