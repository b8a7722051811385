//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod file_system;
pub mod module_parser;
pub mod path_watcher;
pub mod route_registry;
pub mod schema_synthesizer;

pub use file_system::{FileSystem, FsError, FsResult};
pub use module_parser::{ImportedName, ModuleParser, ParseError, ParsedModule, RouteDeclaration, TypeImport};
pub use path_watcher::PathWatcher;
pub use route_registry::{RegistryScan, RouteRegistry};
pub use schema_synthesizer::{SchemaSynthesizer, Synthesis};
