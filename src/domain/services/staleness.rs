//! Staleness detection for generated routes
//!
//! The sole gate in front of expensive regeneration: a route is up to date
//! if and only if its own source checksum and every recorded dependency
//! checksum match the live files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::entities::{
    normalize_relative_path, resolve_relative_path, DependencyHashMap, Route,
};
use crate::domain::ports::file_system::{FileSystem, FsResult};
use crate::domain::value_objects::ContentHash;

/// Why a route was judged stale or fresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    UpToDate,
    SourceChanged,
    DependencyChanged(String),
    DependencyMissing(String),
}

impl Verdict {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Verdict::UpToDate)
    }
}

/// Computes and compares dependency hash maps relative to a project root
pub struct StalenessChecker<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
}

impl<'a> StalenessChecker<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path) -> Self {
        Self { fs, root }
    }

    /// Checksum of the route source combined with its parameter text
    pub fn source_hash(&self, route: &Route) -> FsResult<ContentHash> {
        let source = self.fs.read(route.source_file())?;
        Ok(ContentHash::from_parts([
            source.as_str(),
            route.params().unwrap_or_default(),
        ]))
    }

    /// Build a fresh hash map for `route` and its discovered dependency files.
    ///
    /// Dependencies are deduplicated by relative path. Files under the route's
    /// own output directory and the route source itself are left out. A file
    /// that vanished since discovery is recorded as missing (`"0"`), so its
    /// return counts as a change.
    pub fn compute_hash_map(
        &self,
        route: &Route,
        dep_files: &[PathBuf],
    ) -> FsResult<DependencyHashMap> {
        let mut map = DependencyHashMap::new(
            normalize_relative_path(self.root, route.source_file()),
            self.source_hash(route)?,
        );

        for dep in dep_files {
            if route.artifacts().contains(dep) || dep == route.source_file() {
                continue;
            }
            let key = normalize_relative_path(self.root, dep);
            if map.dep_hash(&key).is_some() {
                continue;
            }
            match self.fs.hash(dep) {
                Ok(hash) => map.insert_dep(key, hash),
                Err(e) if e.is_not_found() => {
                    debug!(route = route.id(), dep = %dep.display(), "dependency vanished before hashing");
                    map.insert_dep(key, ContentHash::missing());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(map)
    }

    /// Compare live checksums against a stored map.
    ///
    /// A changed source short-circuits: dependency files are not read at all.
    pub fn verdict(&self, route: &Route, stored: &DependencyHashMap) -> Verdict {
        let live = match self.source_hash(route) {
            Ok(hash) => hash,
            Err(_) => return Verdict::SourceChanged,
        };
        if !live.matches_str(stored.hash()) || stored.is_placeholder() {
            return Verdict::SourceChanged;
        }

        for (key, stored_hash) in stored.deps() {
            let path = resolve_relative_path(self.root, key);
            let live = self.fs.hash(&path).unwrap_or_else(|_| ContentHash::missing());
            if &live == stored_hash {
                continue;
            }
            if live.is_missing() {
                return Verdict::DependencyMissing(key.clone());
            }
            return Verdict::DependencyChanged(key.clone());
        }

        Verdict::UpToDate
    }

    /// `true` when the route must be regenerated
    pub fn is_stale(&self, route: &Route, stored: &DependencyHashMap) -> bool {
        let verdict = self.verdict(route, stored);
        if verdict.is_stale() {
            debug!(route = route.id(), ?verdict, "route is stale");
        }
        verdict.is_stale()
    }

    /// Absolute paths of every dependency recorded in `stored`
    pub fn extract_dep_files(&self, stored: &DependencyHashMap) -> Vec<PathBuf> {
        stored
            .deps()
            .keys()
            .map(|key| resolve_relative_path(self.root, key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RouteRoots;
    use crate::infrastructure::fs::MemoryFs;

    const ROOT: &str = "/project";

    fn route() -> Route {
        Route::new(
            "orders",
            "/project/src/routes/orders.ts",
            Path::new("/project/.routegen"),
            RouteRoots::new(Some("{ id: string }".to_string()), None, None),
        )
    }

    fn fs() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.insert("/project/src/routes/orders.ts", "export const orders = route<{ id: string }>();");
        fs.insert("/project/src/models.ts", "export type Order = { id: string };");
        fs
    }

    #[test]
    fn unchanged_route_is_fresh_on_successive_calls() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();

        assert!(!checker.is_stale(&route(), &map));
        assert!(!checker.is_stale(&route(), &map));
    }

    #[test]
    fn source_change_dominates_without_reading_deps() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();

        fs.insert("/project/src/routes/orders.ts", "export const orders = route<{ id: number }>();");
        fs.reset_counters();

        assert_eq!(checker.verdict(&route(), &map), Verdict::SourceChanged);
        assert_eq!(fs.read_count(Path::new("/project/src/models.ts")), 0);
    }

    #[test]
    fn params_change_invalidates() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker.compute_hash_map(&route(), &[]).unwrap();

        let changed = Route::new(
            "orders",
            "/project/src/routes/orders.ts",
            Path::new("/project/.routegen"),
            RouteRoots::new(Some("{ id: number }".to_string()), None, None),
        );
        assert!(checker.is_stale(&changed, &map));
    }

    #[test]
    fn dependency_change_is_stale() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();

        fs.insert("/project/src/models.ts", "export type Order = { id: string; qty: number };");
        assert_eq!(
            checker.verdict(&route(), &map),
            Verdict::DependencyChanged("src/models.ts".to_string())
        );
    }

    #[test]
    fn missing_dependency_is_stale() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();

        fs.remove("/project/src/models.ts");
        assert_eq!(
            checker.verdict(&route(), &map),
            Verdict::DependencyMissing("src/models.ts".to_string())
        );
    }

    #[test]
    fn vanished_dependency_is_recorded_as_missing() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        fs.remove("/project/src/models.ts");

        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();

        assert_eq!(map.dep_hash("src/models.ts"), Some(&ContentHash::missing()));
        assert_eq!(
            checker.extract_dep_files(&map),
            vec![PathBuf::from("/project/src/models.ts")]
        );
        assert!(!checker.is_stale(&route(), &map));

        fs.insert("/project/src/models.ts", "export type Order = { id: string };");
        assert_eq!(
            checker.verdict(&route(), &map),
            Verdict::DependencyChanged("src/models.ts".to_string())
        );
    }

    #[test]
    fn placeholder_is_always_stale() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = DependencyHashMap::placeholder("src/routes/orders.ts");
        assert!(checker.is_stale(&route(), &map));
    }

    #[test]
    fn hash_map_excludes_own_outputs_and_duplicates() {
        let fs = fs();
        fs.insert("/project/.routegen/orders/types.d.ts", "export type X = string;");
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(
                &route(),
                &[
                    PathBuf::from("/project/src/models.ts"),
                    PathBuf::from("/project/src/models.ts"),
                    PathBuf::from("/project/.routegen/orders/types.d.ts"),
                    PathBuf::from("/project/src/routes/orders.ts"),
                ],
            )
            .unwrap();

        let keys: Vec<_> = map.deps().keys().cloned().collect();
        assert_eq!(keys, vec!["src/models.ts"]);
        assert_eq!(map.file(), "src/routes/orders.ts");
    }

    #[test]
    fn extract_dep_files_resolves_against_root() {
        let fs = fs();
        let checker = StalenessChecker::new(&fs, Path::new(ROOT));
        let map = checker
            .compute_hash_map(&route(), &[PathBuf::from("/project/src/models.ts")])
            .unwrap();
        assert_eq!(
            checker.extract_dep_files(&map),
            vec![PathBuf::from("/project/src/models.ts")]
        );
    }
}
