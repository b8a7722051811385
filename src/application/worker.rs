//! Rebuild workers
//!
//! One short-lived thread per stale route. A worker receives everything it
//! needs in its request, runs discovery, synthesis and emission, and answers
//! with exactly one message over a one-shot channel. Workers never touch the
//! watch set or the hash-map files; they return data and the scheduler
//! applies it.

use std::any::Any;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::{Builder, JoinHandle};

use tracing::{debug, warn};

use crate::domain::entities::{normalize_relative_path, DependencyHashMap, Route};
use crate::domain::ports::file_system::FileSystem;
use crate::domain::ports::module_parser::ModuleParser;
use crate::domain::ports::schema_synthesizer::SchemaSynthesizer;
use crate::domain::services::StalenessChecker;
use crate::error::{RegenError, RegenResult};
use crate::infrastructure::write_guard::WriteGuard;

use super::discovery::TypeClosureDiscoverer;
use super::emit::{render_artifact, render_types};

/// Shared, read-only state handed to every worker
pub struct WorkerContext {
    pub fs: Arc<dyn FileSystem>,
    pub parser: Arc<dyn ModuleParser>,
    pub synthesizer: Arc<dyn SchemaSynthesizer>,
    pub guard: Arc<WriteGuard>,
    /// Project root; hash-map paths are stored relative to it
    pub root: PathBuf,
    pub max_depth: usize,
}

/// Work order for one route
pub enum WorkerRequest {
    /// First generation of a route (no usable hash map yet)
    Bootstrap {
        route: Route,
        context: Arc<WorkerContext>,
    },
    /// Regeneration of a route with a previous hash map
    Incremental {
        route: Route,
        context: Arc<WorkerContext>,
        /// Dependencies recorded by the previous generation
        known_deps: BTreeSet<PathBuf>,
    },
}

impl WorkerRequest {
    pub fn route(&self) -> &Route {
        match self {
            WorkerRequest::Bootstrap { route, .. } | WorkerRequest::Incremental { route, .. } => route,
        }
    }

    fn context(&self) -> &WorkerContext {
        match self {
            WorkerRequest::Bootstrap { context, .. } | WorkerRequest::Incremental { context, .. } => {
                context
            }
        }
    }
}

/// The single reply of a worker
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Completed {
        route_id: String,
        hash_map: DependencyHashMap,
        /// Every dependency file of the new closure
        dep_files: Vec<PathBuf>,
        /// Dependencies not recorded by the previous generation
        new_dependencies: Vec<PathBuf>,
        diagnostics: Vec<String>,
        /// Generated files whose content actually changed
        written: Vec<PathBuf>,
    },
    Failed {
        route_id: String,
        message: String,
    },
}

impl WorkerMessage {
    pub fn route_id(&self) -> &str {
        match self {
            WorkerMessage::Completed { route_id, .. } | WorkerMessage::Failed { route_id, .. } => {
                route_id
            }
        }
    }
}

/// Discovery, synthesis and emission for one route
pub fn run(request: &WorkerRequest) -> WorkerMessage {
    let route = request.route();
    match generate(request) {
        Ok(message) => message,
        Err(e) => WorkerMessage::Failed {
            route_id: route.id().to_string(),
            message: e.to_string(),
        },
    }
}

fn generate(request: &WorkerRequest) -> RegenResult<WorkerMessage> {
    let route = request.route();
    let ctx = request.context();

    let discovery =
        TypeClosureDiscoverer::new(ctx.fs.as_ref(), ctx.parser.as_ref(), ctx.max_depth).discover(route);
    let synthesis = ctx.synthesizer.synthesize(&discovery.closure_text());
    if !synthesis.errors.is_empty() {
        warn!(route = route.id(), errors = ?synthesis.errors, "schema synthesis failed");
    }

    let source = normalize_relative_path(&ctx.root, route.source_file());
    let artifacts = route.artifacts();
    let mut written = Vec::new();
    if ctx.guard.write(artifacts.types(), &render_types(&source, &discovery))?.is_written() {
        written.push(artifacts.types().to_path_buf());
    }
    let artifact = render_artifact(route, &source, &discovery, &synthesis);
    if ctx.guard.write(artifacts.artifact(), &artifact)?.is_written() {
        written.push(artifacts.artifact().to_path_buf());
    }

    let dep_files = discovery.dependency_files();
    let hash_map = StalenessChecker::new(ctx.fs.as_ref(), &ctx.root).compute_hash_map(route, &dep_files)?;

    let new_dependencies = match request {
        WorkerRequest::Bootstrap { .. } => dep_files.clone(),
        WorkerRequest::Incremental { known_deps, .. } => dep_files
            .iter()
            .filter(|dep| !known_deps.contains(*dep))
            .cloned()
            .collect(),
    };

    let mut diagnostics = discovery.diagnostics().to_vec();
    diagnostics.extend(synthesis.errors);
    debug!(
        route = route.id(),
        deps = dep_files.len(),
        written = written.len(),
        "worker finished"
    );

    Ok(WorkerMessage::Completed {
        route_id: route.id().to_string(),
        hash_map,
        dep_files,
        new_dependencies,
        diagnostics,
        written,
    })
}

/// A running worker thread and its reply channel
pub struct WorkerHandle {
    route_id: String,
    reply: Receiver<WorkerMessage>,
    thread: JoinHandle<()>,
}

/// Start a worker thread for `request`.
///
/// Failure to create the thread is a worker-pool failure, not a route failure.
pub fn spawn(request: WorkerRequest) -> RegenResult<WorkerHandle> {
    let route_id = request.route().id().to_string();
    let (tx, rx) = sync_channel(1);
    let thread = Builder::new()
        .name(format!("routegen-worker-{route_id}"))
        .spawn(move || {
            let message = run(&request);
            let _ = tx.send(message);
        })
        .map_err(|e| RegenError::WorkerPool {
            route: route_id.clone(),
            message: e.to_string(),
        })?;

    Ok(WorkerHandle {
        route_id,
        reply: rx,
        thread,
    })
}

impl WorkerHandle {
    /// Wait for the worker; a panic becomes a `Failed` message.
    pub fn join(self) -> WorkerMessage {
        match self.thread.join() {
            Ok(()) => self.reply.recv().unwrap_or_else(|_| WorkerMessage::Failed {
                route_id: self.route_id.clone(),
                message: "worker exited without reporting".to_string(),
            }),
            Err(payload) => WorkerMessage::Failed {
                message: format!("worker panicked: {}", panic_message(payload.as_ref())),
                route_id: self.route_id,
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
