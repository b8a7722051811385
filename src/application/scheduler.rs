//! Rebuild Scheduler
//!
//! Filters routes down to the stale ones and regenerates them in batches of
//! at most `jobs` concurrent workers. Batches run one after another; within a
//! batch every worker runs in parallel and a failing worker never affects its
//! siblings. The scheduler, not the workers, persists hash maps.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info, warn};

use crate::domain::entities::{normalize_relative_path, DependencyHashMap, Route};
use crate::domain::services::{StalenessChecker, Verdict};
use crate::error::RegenResult;
use crate::infrastructure::repositories::JsonHashMapRepository;

use super::worker::{self, WorkerContext, WorkerHandle, WorkerMessage, WorkerRequest};

/// Outcome of one `rebuild` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Routes regenerated successfully
    pub rebuilt: Vec<String>,
    /// Routes skipped because nothing changed
    pub up_to_date: Vec<String>,
    /// Routes whose worker failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Files whose content changed on disk
    pub written: Vec<PathBuf>,
    /// Dependency files not recorded by the previous generation, per route
    pub new_dependencies: Vec<(PathBuf, String)>,
    /// Non-fatal problems, prefixed with the route id
    pub diagnostics: Vec<String>,
}

impl RebuildReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Number of concurrent workers for a configured value (0 = one per CPU)
pub fn resolve_jobs(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

pub struct RebuildScheduler {
    context: Arc<WorkerContext>,
    repository: JsonHashMapRepository,
    jobs: usize,
}

impl RebuildScheduler {
    pub fn new(context: Arc<WorkerContext>, jobs: usize) -> Self {
        let repository = JsonHashMapRepository::new(context.fs.clone(), context.guard.clone());
        Self {
            context,
            repository,
            jobs: jobs.max(1),
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    fn checker(&self) -> StalenessChecker<'_> {
        StalenessChecker::new(self.context.fs.as_ref(), &self.context.root)
    }

    fn stored_map(&self, route: &Route) -> DependencyHashMap {
        let file = normalize_relative_path(&self.context.root, route.source_file());
        self.repository
            .load_or_placeholder(route.artifacts().hash_map(), &file)
    }

    /// Dependency files recorded by the last successful generation of `route`
    pub fn known_dependencies(&self, route: &Route) -> Vec<PathBuf> {
        self.checker().extract_dep_files(&self.stored_map(route))
    }

    /// Staleness of every route, without generating anything
    pub fn status(&self, routes: &[Route]) -> Vec<(String, Verdict)> {
        let checker = self.checker();
        routes
            .iter()
            .map(|route| {
                let stored = self.stored_map(route);
                (route.id().to_string(), checker.verdict(route, &stored))
            })
            .collect()
    }

    /// Regenerate every stale route in `routes`.
    ///
    /// Only a failure to start worker threads is returned as an error; every
    /// per-route problem ends up in the report.
    pub fn rebuild(&self, routes: &[Route]) -> RegenResult<RebuildReport> {
        let mut report = RebuildReport::default();
        let checker = self.checker();

        let mut stale = Vec::new();
        for route in routes {
            let file = normalize_relative_path(&self.context.root, route.source_file());
            match self.repository.ensure_placeholder(route.artifacts().hash_map(), &file) {
                Ok(true) => report.written.push(route.artifacts().hash_map().to_path_buf()),
                Ok(false) => {}
                Err(e) => {
                    error!(route = route.id(), error = %e, "cannot write placeholder hash map");
                    report.failed.push((route.id().to_string(), e.to_string()));
                    continue;
                }
            }

            let stored = self.stored_map(route);
            let verdict = checker.verdict(route, &stored);
            if verdict.is_stale() {
                debug!(route = route.id(), ?verdict, "route is stale");
                stale.push((route, stored));
            } else {
                report.up_to_date.push(route.id().to_string());
            }
        }

        if stale.is_empty() {
            debug!(up_to_date = report.up_to_date.len(), "nothing to rebuild");
            return Ok(report);
        }
        info!(stale = stale.len(), jobs = self.jobs, "rebuilding routes");

        for batch in stale.chunks(self.jobs) {
            let mut handles: Vec<(WorkerHandle, &Route)> = Vec::with_capacity(batch.len());
            for (route, stored) in batch {
                let request = if stored.is_placeholder() {
                    WorkerRequest::Bootstrap {
                        route: (*route).clone(),
                        context: self.context.clone(),
                    }
                } else {
                    WorkerRequest::Incremental {
                        route: (*route).clone(),
                        context: self.context.clone(),
                        known_deps: checker.extract_dep_files(stored).into_iter().collect::<BTreeSet<_>>(),
                    }
                };
                match worker::spawn(request) {
                    Ok(handle) => handles.push((handle, *route)),
                    Err(e) => {
                        // Let the workers already started finish before giving up.
                        for (handle, _) in handles {
                            handle.join();
                        }
                        return Err(e);
                    }
                }
            }

            for (handle, route) in handles {
                self.apply(route, handle.join(), &mut report);
            }
        }

        info!(
            rebuilt = report.rebuilt.len(),
            failed = report.failed.len(),
            written = report.written.len(),
            "rebuild finished"
        );
        Ok(report)
    }

    fn apply(&self, route: &Route, message: WorkerMessage, report: &mut RebuildReport) {
        match message {
            WorkerMessage::Completed {
                route_id,
                hash_map,
                new_dependencies,
                diagnostics,
                written,
                ..
            } => {
                for diagnostic in diagnostics {
                    warn!(route = %route_id, "{diagnostic}");
                    report.diagnostics.push(format!("{route_id}: {diagnostic}"));
                }
                report.written.extend(written);

                let path = route.artifacts().hash_map();
                match self.repository.save(&hash_map, path) {
                    Ok(outcome) => {
                        if outcome.is_written() {
                            report.written.push(path.to_path_buf());
                        }
                    }
                    Err(e) => {
                        error!(route = %route_id, error = %e, "cannot write hash map");
                        report.failed.push((route_id, e.to_string()));
                        return;
                    }
                }

                report
                    .new_dependencies
                    .extend(new_dependencies.into_iter().map(|dep| (dep, route_id.clone())));
                report.rebuilt.push(route_id);
            }
            WorkerMessage::Failed { route_id, message } => {
                error!(route = %route_id, error = %message, "worker failed; previous artifacts left in place");
                report.failed.push((route_id, message));
            }
        }
    }
}
