//! Watch Coordinator
//!
//! Owns the route table and the Watch Set and turns file change
//! notifications into scheduler runs. Change handling (`handle_changes`) is
//! plain coordination logic over the `PathWatcher` port; only `run` needs a
//! real notify watcher.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::application::scheduler::{RebuildReport, RebuildScheduler};
use crate::domain::entities::Route;
use crate::domain::ports::file_system::FileSystem;
use crate::domain::ports::path_watcher::PathWatcher;
use crate::domain::ports::route_registry::RouteRegistry;
use crate::domain::value_objects::ContentHash;
use crate::error::{RegenError, RegenResult};
use crate::infrastructure::watcher::NotifyWatcher;

use super::event::{WatchEvent, WatcherState, DEBOUNCE_MS};
use super::watch_set::WatchSet;

/// Options for the watch operation
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory holding the route source modules
    pub routes_dir: PathBuf,
    /// Generated output root; changes below it are never acted on
    pub output_dir: PathBuf,
    pub debounce: Duration,
}

impl WatchOptions {
    pub fn new(routes_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
            output_dir: output_dir.into(),
            debounce: Duration::from_millis(DEBOUNCE_MS),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Result of handling one batch of changed paths
#[derive(Debug, Clone, Default)]
pub struct ChangeOutcome {
    /// Route ids handed to the scheduler, sorted
    pub affected: Vec<String>,
    pub report: RebuildReport,
}

pub struct WatchCoordinator<W: PathWatcher> {
    options: WatchOptions,
    registry: Arc<dyn RouteRegistry>,
    scheduler: RebuildScheduler,
    fs: Arc<dyn FileSystem>,
    watcher: W,
    routes: BTreeMap<String, Route>,
    /// Source module -> ids of the routes it declares
    sources: HashMap<PathBuf, BTreeSet<String>>,
    watch_set: WatchSet,
}

impl<W: PathWatcher> WatchCoordinator<W> {
    pub fn new(
        options: WatchOptions,
        registry: Arc<dyn RouteRegistry>,
        scheduler: RebuildScheduler,
        fs: Arc<dyn FileSystem>,
        watcher: W,
    ) -> Self {
        Self {
            options,
            registry,
            scheduler,
            fs,
            watcher,
            routes: BTreeMap::new(),
            sources: HashMap::new(),
            watch_set: WatchSet::new(),
        }
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    /// Scan the routes directory, set up the watch surface and rebuild
    /// every stale route.
    ///
    /// The Watch Set is seeded from the hash maps of earlier sessions so that
    /// dependencies of up-to-date routes are watched without regenerating them.
    pub fn bootstrap(&mut self, on_event: &impl Fn(WatchEvent)) -> RegenResult<RebuildReport> {
        let scan = self.registry.scan()?;
        for diagnostic in &scan.diagnostics {
            warn!("{diagnostic}");
            on_event(WatchEvent::Error {
                message: diagnostic.clone(),
            });
        }

        self.watcher.add_recursive(&self.options.routes_dir)?;
        for route in scan.routes {
            let source = route.source_file().to_path_buf();
            self.watcher.add(&source)?;
            self.sources
                .entry(source)
                .or_default()
                .insert(route.id().to_string());
            self.routes.insert(route.id().to_string(), route);
        }

        let mut seeded = 0;
        for route in self.routes.values() {
            for dep in self.scheduler.known_dependencies(route) {
                if self.watch_set.insert(dep.clone(), route.id()) {
                    self.watcher.add(&dep)?;
                    seeded += 1;
                }
            }
        }
        info!(
            routes = self.routes.len(),
            dependencies = seeded,
            "watch surface ready"
        );

        on_event(WatchEvent::WatchStarted {
            routes_dir: self.options.routes_dir.display().to_string(),
            routes: self.routes.len(),
        });

        let all: Vec<Route> = self.routes.values().cloned().collect();
        self.rebuild(&all, on_event)
    }

    /// React to a debounced batch of changed files.
    ///
    /// A changed route source is re-read so added and removed routes are
    /// picked up; a changed dependency marks every route listed under it in
    /// the Watch Set. Anything else is ignored.
    pub fn handle_changes(
        &mut self,
        paths: &[PathBuf],
        on_event: &impl Fn(WatchEvent),
    ) -> RegenResult<ChangeOutcome> {
        let mut affected = BTreeSet::new();

        for path in paths {
            if path.starts_with(&self.options.output_dir) {
                debug!(path = %path.display(), "ignoring generated file");
                continue;
            }
            if self.sources.contains_key(path) || self.registry.is_source_candidate(path) {
                self.resync_source(path, &mut affected, on_event);
            }
            for id in self.watch_set.dependents(path) {
                if self.routes.contains_key(id) {
                    affected.insert(id.to_string());
                }
            }
        }

        if affected.is_empty() {
            return Ok(ChangeOutcome::default());
        }

        let routes: Vec<Route> = affected
            .iter()
            .filter_map(|id| self.routes.get(id).cloned())
            .collect();
        let report = self.rebuild(&routes, on_event)?;
        Ok(ChangeOutcome {
            affected: affected.into_iter().collect(),
            report,
        })
    }

    fn resync_source(
        &mut self,
        path: &Path,
        affected: &mut BTreeSet<String>,
        on_event: &impl Fn(WatchEvent),
    ) {
        let previous = self.sources.get(path).cloned().unwrap_or_default();
        let declared = match self.registry.scan_file(path) {
            Ok(routes) => routes,
            Err(e) => {
                // Keep the routes we knew; the rebuild records the parse failure.
                warn!(file = %path.display(), error = %e, "could not rescan route module");
                on_event(WatchEvent::Error {
                    message: e.to_string(),
                });
                affected.extend(previous);
                return;
            }
        };

        let mut current = BTreeSet::new();
        for route in declared {
            let id = route.id().to_string();
            if let Some(existing) = self.routes.get(&id) {
                if existing.source_file() != path {
                    let err = RegenError::DuplicateRoute {
                        id,
                        file: path.to_path_buf(),
                        first: existing.source_file().to_path_buf(),
                    };
                    warn!("{err}");
                    on_event(WatchEvent::Error {
                        message: err.to_string(),
                    });
                    continue;
                }
            }
            if !previous.contains(&id) {
                info!(route = %id, file = %path.display(), "route added");
            }
            current.insert(id.clone());
            self.routes.insert(id.clone(), route);
            affected.insert(id);
        }

        for id in previous.difference(&current) {
            info!(route = %id, file = %path.display(), "route removed");
            self.routes.remove(id);
            self.watch_set.remove_route(id);
            affected.remove(id);
            on_event(WatchEvent::RouteRemoved { route: id.clone() });
        }

        if current.is_empty() {
            self.sources.remove(path);
        } else {
            self.sources.insert(path.to_path_buf(), current);
        }
    }

    fn rebuild(&mut self, routes: &[Route], on_event: &impl Fn(WatchEvent)) -> RegenResult<RebuildReport> {
        on_event(WatchEvent::RebuildStarted {
            routes: routes.iter().map(|r| r.id().to_string()).collect(),
        });

        let report = match self.scheduler.rebuild(routes) {
            Ok(report) => report,
            Err(e) => {
                on_event(WatchEvent::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        for (route, message) in &report.failed {
            on_event(WatchEvent::RouteFailed {
                route: route.clone(),
                message: message.clone(),
            });
        }
        self.extend_watch_set(&report, on_event);
        on_event(WatchEvent::rebuild_complete(&report));
        Ok(report)
    }

    fn extend_watch_set(&mut self, report: &RebuildReport, on_event: &impl Fn(WatchEvent)) {
        for (path, route) in &report.new_dependencies {
            if !self.watch_set.insert(path.clone(), route.clone()) {
                continue;
            }
            if let Err(e) = self.watcher.add(path) {
                warn!(path = %path.display(), error = %e, "could not watch dependency");
                on_event(WatchEvent::Error {
                    message: e.to_string(),
                });
                continue;
            }
            debug!(path = %path.display(), route = %route, "dependency added to watch set");
            on_event(WatchEvent::DependencyAdded {
                path: path.display().to_string(),
                route: route.clone(),
            });
        }
    }

    fn is_relevant(&self, path: &Path) -> bool {
        !path.starts_with(&self.options.output_dir)
            && (self.sources.contains_key(path)
                || self.watch_set.contains(path)
                || self.registry.is_source_candidate(path))
    }

    fn known_hashes(&self) -> HashMap<PathBuf, ContentHash> {
        self.sources
            .keys()
            .map(PathBuf::as_path)
            .chain(self.watch_set.paths())
            .filter_map(|path| {
                self.fs
                    .hash(path)
                    .ok()
                    .map(|hash| (path.to_path_buf(), hash))
            })
            .collect()
    }
}

impl WatchCoordinator<NotifyWatcher> {
    /// Bootstrap, then watch until `running` is cleared (blocking).
    pub fn run<F>(&mut self, running: Arc<AtomicBool>, on_event: F) -> RegenResult<()>
    where
        F: Fn(WatchEvent),
    {
        self.bootstrap(&on_event)?;

        let mut state = WatcherState::with_debounce(self.options.debounce);
        // Pre-populated so editor saves without content changes are skipped.
        let mut content_hashes = self.known_hashes();

        // notify may replay events for freshly registered paths
        let cooldown_end = Instant::now() + Duration::from_millis(500);
        while Instant::now() < cooldown_end {
            let _ = self.watcher.recv_timeout(Duration::from_millis(50));
        }

        while running.load(Ordering::SeqCst) {
            if let Some(path) = self.watcher.recv_timeout(Duration::from_millis(50)) {
                let path = path.canonicalize().unwrap_or(path);
                if self.is_relevant(&path) {
                    match self.fs.hash(&path) {
                        Ok(hash) => {
                            if content_hashes.get(&path) != Some(&hash) {
                                content_hashes.insert(path.clone(), hash);
                                state.add_change(path);
                            }
                        }
                        Err(e) if e.is_not_found() => {
                            if content_hashes.remove(&path).is_some() {
                                state.add_change(path);
                            }
                        }
                        Err(e) => debug!(path = %path.display(), error = %e, "unreadable change"),
                    }
                }
            }

            if state.should_sync() {
                let changes = state.take_changes();
                for path in &changes {
                    on_event(WatchEvent::FileChanged {
                        path: path.display().to_string(),
                    });
                }
                self.handle_changes(&changes, &on_event)?;
            }
        }

        on_event(WatchEvent::Shutdown);
        Ok(())
    }
}
