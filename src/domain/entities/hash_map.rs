//! Dependency hash map entity - per-route staleness record
//!
//! Records a checksum of the route's own source (plus its parameter text) and
//! one checksum per discovered dependency file. Paths are stored relative to
//! the project root so the record survives moving the checkout.
//! It's a pure data structure - I/O is handled by the hash-map repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::value_objects::ContentHash;

/// Normalize a path for storage: relative to `root` when possible, always `/`.
pub fn normalize_relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Resolve a stored path back against `root` (absolute paths are kept).
pub fn resolve_relative_path(root: &Path, stored: &str) -> PathBuf {
    let path = if cfg!(windows) {
        PathBuf::from(stored.replace('/', "\\"))
    } else {
        PathBuf::from(stored)
    };
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

/// Staleness record of one route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyHashMap {
    /// Route source file, relative to the project root
    file: String,
    /// Checksum of route source + parameter text; empty for a placeholder
    hash: String,
    /// Relative dependency path -> checksum
    deps: BTreeMap<String, ContentHash>,
}

impl DependencyHashMap {
    pub fn new(file: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            file: file.into(),
            hash: hash.to_string(),
            deps: BTreeMap::new(),
        }
    }

    /// Empty map written before the first generation of a route.
    ///
    /// Its source hash never matches a live checksum, so the route is stale.
    pub fn placeholder(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            hash: String::new(),
            deps: BTreeMap::new(),
        }
    }

    /// Rebuild from stored parts (used by repositories)
    pub fn from_parts(
        file: impl Into<String>,
        hash: impl Into<String>,
        deps: BTreeMap<String, ContentHash>,
    ) -> Self {
        Self {
            file: file.into(),
            hash: hash.into(),
            deps,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_placeholder(&self) -> bool {
        self.hash.is_empty()
    }

    pub fn deps(&self) -> &BTreeMap<String, ContentHash> {
        &self.deps
    }

    pub fn insert_dep(&mut self, path: impl Into<String>, hash: ContentHash) {
        self.deps.insert(path.into(), hash);
    }

    pub fn dep_hash(&self, path: &str) -> Option<&ContentHash> {
        self.deps.get(path)
    }
}
