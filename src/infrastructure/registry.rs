//! Route registry over a directory of handler modules
//!
//! Walks the routes directory (respecting `.gitignore`/`.ignore`), parses every
//! candidate module and turns each `export const <id> = route<...>(...)` into a
//! `Route`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::domain::entities::{Route, RouteRoots};
use crate::domain::ports::file_system::FileSystem;
use crate::domain::ports::module_parser::ModuleParser;
use crate::domain::ports::route_registry::{RegistryScan, RouteRegistry};
use crate::error::{RegenError, RegenResult};

/// `RouteRegistry` backed by the local routes directory
pub struct FsRouteRegistry {
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn ModuleParser>,
    routes_dir: PathBuf,
    output_dir: PathBuf,
    extensions: Vec<String>,
}

impl FsRouteRegistry {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        parser: Arc<dyn ModuleParser>,
        routes_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            parser,
            routes_dir: routes_dir.into(),
            output_dir: output_dir.into(),
            extensions: vec!["ts".to_string(), "tsx".to_string()],
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    fn routes_in(&self, path: &Path) -> RegenResult<Vec<Route>> {
        let text = self.fs.read(path)?;
        let module = self.parser.parse(path, &text)?;
        Ok(module
            .routes
            .into_iter()
            .map(|decl| {
                Route::new(
                    decl.name,
                    path,
                    &self.output_dir,
                    RouteRoots::from_positional(&decl.type_args),
                )
            })
            .collect())
    }
}

impl RouteRegistry for FsRouteRegistry {
    fn scan(&self) -> RegenResult<RegistryScan> {
        if !self.routes_dir.is_dir() {
            return Err(RegenError::DirectoryNotFound {
                path: self.routes_dir.clone(),
            });
        }

        let output_dir = self.output_dir.clone();
        let walker = WalkBuilder::new(&self.routes_dir)
            .hidden(true)
            .git_ignore(true)
            .parents(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !entry.path().starts_with(&output_dir))
            .build();

        let mut scan = RegistryScan::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    scan.diagnostics.push(e.to_string());
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) || !self.is_source_candidate(path) {
                continue;
            }

            let routes = match self.routes_in(path) {
                Ok(routes) => routes,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "could not scan route module");
                    scan.diagnostics.push(e.to_string());
                    continue;
                }
            };
            for route in routes {
                if let Some(first) = seen.get(route.id()) {
                    let err = RegenError::DuplicateRoute {
                        id: route.id().to_string(),
                        file: route.source_file().to_path_buf(),
                        first: first.clone(),
                    };
                    warn!("{err}");
                    scan.diagnostics.push(err.to_string());
                    continue;
                }
                debug!(route = route.id(), file = %path.display(), "found route");
                seen.insert(route.id().to_string(), route.source_file().to_path_buf());
                scan.routes.push(route);
            }
        }

        Ok(scan)
    }

    fn scan_file(&self, path: &Path) -> RegenResult<Vec<Route>> {
        match self.routes_in(path) {
            Err(RegenError::Fs(e)) if e.is_not_found() => {
                debug!(file = %path.display(), "route module deleted");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn is_source_candidate(&self, path: &Path) -> bool {
        if !path.starts_with(&self.routes_dir) || path.starts_with(&self.output_dir) {
            return false;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".d.ts") {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}
