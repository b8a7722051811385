//! Pipeline Factory
//!
//! Wires the registry, scheduler and watch coordinator with their
//! infrastructure dependencies. This is the dependency injection point for
//! the binary and for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::application::{resolve_jobs, RebuildScheduler, WatchCoordinator, WatchOptions, WorkerContext};
use crate::config::{Config, ConfigWarning};
use crate::domain::ports::{FileSystem, ModuleParser, RouteRegistry};
use crate::error::{RegenError, RegenResult};
use crate::infrastructure::{
    FsRouteRegistry, JsonSchemaSynthesizer, LocalFs, NotifyWatcher, TsModuleParser, WriteGuard,
};

/// A project root together with its resolved configuration
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Canonicalize `root` so paths match the ones reported by the watcher.
    pub fn new(root: &Path, config: Config) -> RegenResult<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| RegenError::DirectoryNotFound {
                path: root.to_path_buf(),
            })?;
        Ok(Self { root, config })
    }

    /// Resolve configuration for `root` and build the project
    pub fn load(root: &Path, config_file: Option<&Path>) -> RegenResult<(Self, Vec<ConfigWarning>)> {
        let (config, warnings) = Config::resolve(root, config_file)?;
        Ok((Self::new(root, config)?, warnings))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn routes_dir(&self) -> PathBuf {
        self.config.routes_dir(&self.root)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.config.output_dir(&self.root)
    }
}

/// Registry and scheduler sharing one file system and parser
pub struct Pipeline {
    pub fs: Arc<dyn FileSystem>,
    pub registry: Arc<dyn RouteRegistry>,
    pub scheduler: RebuildScheduler,
    routes_dir: PathBuf,
    output_dir: PathBuf,
    debounce: std::time::Duration,
}

/// Create the generation pipeline for `project` on the local file system
pub fn create_pipeline(project: &Project) -> Pipeline {
    create_pipeline_with(project, Arc::new(LocalFs::new()))
}

/// Create the generation pipeline over a specific file system
pub fn create_pipeline_with(project: &Project, fs: Arc<dyn FileSystem>) -> Pipeline {
    let config = &project.config;
    let parser: Arc<dyn ModuleParser> = Arc::new(TsModuleParser::new(config.routes.factory.clone()));
    let routes_dir = project.routes_dir();
    let output_dir = project.output_dir();

    let registry = FsRouteRegistry::new(fs.clone(), parser.clone(), routes_dir.clone(), output_dir.clone())
        .with_extensions(config.routes.extensions.clone());

    let context = Arc::new(WorkerContext {
        guard: Arc::new(WriteGuard::new(fs.clone())),
        fs: fs.clone(),
        parser,
        synthesizer: Arc::new(JsonSchemaSynthesizer::new()),
        root: project.root().to_path_buf(),
        max_depth: config.discovery.max_depth,
    });
    let jobs = resolve_jobs(config.scheduler.jobs);
    debug!(
        routes_dir = %routes_dir.display(),
        output_dir = %output_dir.display(),
        jobs,
        max_depth = config.discovery.max_depth,
        "pipeline ready"
    );

    Pipeline {
        fs,
        registry: Arc::new(registry),
        scheduler: RebuildScheduler::new(context, jobs),
        routes_dir,
        output_dir,
        debounce: config.debounce(),
    }
}

impl Pipeline {
    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    /// Hand the pipeline to a watch coordinator driven by notify
    pub fn into_watch_coordinator(self) -> RegenResult<WatchCoordinator<NotifyWatcher>> {
        let options = WatchOptions::new(self.routes_dir, self.output_dir).with_debounce(self.debounce);
        Ok(WatchCoordinator::new(
            options,
            self.registry,
            self.scheduler,
            self.fs,
            NotifyWatcher::new()?,
        ))
    }
}
