//! In-memory file system
//!
//! Records every read and write so tests can assert exactly which files the
//! pipeline touched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::ports::file_system::{FileSystem, FsError, FsResult};

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, String>,
    reads: HashMap<PathBuf, usize>,
    writes: HashMap<PathBuf, usize>,
}

/// In-memory file system
///
/// Uses `Arc<Mutex<>>` internally so it can be cloned and shared across
/// worker threads.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not hide the files from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file without counting it as a write
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.state().files.insert(path.into(), content.into());
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.state().files.remove(path.as_ref());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state().files.get(path.as_ref()).cloned()
    }

    pub fn read_count(&self, path: &Path) -> usize {
        self.state().reads.get(path).copied().unwrap_or(0)
    }

    pub fn write_count(&self, path: &Path) -> usize {
        self.state().writes.get(path).copied().unwrap_or(0)
    }

    pub fn total_writes(&self) -> usize {
        self.state().writes.values().sum()
    }

    pub fn reset_counters(&self) {
        let mut state = self.state();
        state.reads.clear();
        state.writes.clear();
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &Path) -> FsResult<String> {
        let mut state = self.state();
        *state.reads.entry(path.to_path_buf()).or_default() += 1;
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, content: &str) -> FsResult<()> {
        let mut state = self.state();
        *state.writes.entry(path.to_path_buf()).or_default() += 1;
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.state().files.contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> FsResult<()> {
        Ok(())
    }
}
