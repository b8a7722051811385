//! Domain Entities
//!
//! Core domain objects: routes, type declarations and dependency hash maps.
//! These are pure data structures - I/O is handled by repositories and ports.

mod declaration;
mod hash_map;
mod route;

pub use declaration::{DeclarationKind, DiscoveredDeclaration, TypeDeclaration};
pub use hash_map::{normalize_relative_path, resolve_relative_path, DependencyHashMap};
pub use route::{ArtifactPaths, RootRole, Route, RouteRoots};
