//! routegen - incremental route schema generation
//!
//! routegen keeps a generated validation schema next to every route handler.
//! For each route it discovers the closure of TypeScript declarations its
//! root types depend on, synthesizes a JSON Schema from them and writes the
//! result only when something actually changed. In watch mode the set of
//! watched files grows as real dependencies are discovered.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{RebuildReport, RebuildScheduler, WatchCoordinator, WatchEvent};
pub use config::Config;
pub use domain::entities::Route;
pub use error::{RegenError, RegenResult};
pub use presentation::{create_pipeline, Pipeline, Project};
