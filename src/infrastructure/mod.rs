//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - File system implementations (Local, Memory)
//! - `write_guard` - Checksum & write guard for generated files
//! - `repositories/` - Hash-map persistence
//! - `parser/` - tree-sitter TypeScript module parser
//! - `registry` - Route discovery over the routes directory
//! - `synthesizer` - JSON Schema synthesis
//! - `watcher` - notify-backed path watcher

pub mod fs;
pub mod parser;
pub mod registry;
pub mod repositories;
pub mod synthesizer;
pub mod watcher;
pub mod write_guard;

// Re-export for convenience
pub use fs::{LocalFs, MemoryFs};
pub use parser::TsModuleParser;
pub use registry::FsRouteRegistry;
pub use repositories::JsonHashMapRepository;
pub use synthesizer::JsonSchemaSynthesizer;
pub use watcher::NotifyWatcher;
pub use write_guard::{WriteGuard, WriteOutcome};
