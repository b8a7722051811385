//! Route registry port
//!
//! Supplies the routes (entities) of the source tree.

use std::path::Path;

use crate::domain::entities::Route;
use crate::error::RegenResult;

/// Result of scanning the whole source tree
#[derive(Debug, Clone, Default)]
pub struct RegistryScan {
    pub routes: Vec<Route>,
    /// Non-fatal problems (unparseable modules, duplicate ids)
    pub diagnostics: Vec<String>,
}

pub trait RouteRegistry: Send + Sync {
    /// Scan every source module
    fn scan(&self) -> RegenResult<RegistryScan>;

    /// Re-read one source module.
    ///
    /// A deleted module yields no routes; a module that cannot be read or
    /// parsed is an error so callers can keep what they knew before.
    fn scan_file(&self, path: &Path) -> RegenResult<Vec<Route>>;

    /// Whether `path` could hold route declarations
    fn is_source_candidate(&self, path: &Path) -> bool;
}
