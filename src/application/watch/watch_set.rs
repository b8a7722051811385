//! Watch Set: dependency file -> routes depending on it

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Grows monotonically during a session; keys are never removed, only the
/// route ids under them.
#[derive(Debug, Default)]
pub struct WatchSet {
    entries: HashMap<PathBuf, BTreeSet<String>>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `route` depends on `path`.
    ///
    /// Returns `true` when `path` was not a key before.
    pub fn insert(&mut self, path: impl Into<PathBuf>, route: impl Into<String>) -> bool {
        let path = path.into();
        let is_new = !self.entries.contains_key(&path);
        self.entries.entry(path).or_default().insert(route.into());
        is_new
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Routes depending on `path`
    pub fn dependents(&self, path: &Path) -> impl Iterator<Item = &str> {
        self.entries
            .get(path)
            .into_iter()
            .flat_map(|routes| routes.iter().map(String::as_str))
    }

    /// Forget `route` everywhere; the keys themselves stay watched.
    pub fn remove_route(&mut self, route: &str) {
        for routes in self.entries.values_mut() {
            routes.remove(route);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}
