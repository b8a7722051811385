//! Domain Layer
//!
//! The core of routegen - routes, declarations, staleness and closure rules.
//!
//! ## Structure
//!
//! - `entities/` - Core domain entities (Route, TypeDeclaration, DependencyHashMap)
//! - `value_objects/` - Immutable value types (ContentHash)
//! - `services/` - Domain services (StalenessChecker, closure fixed point)
//! - `ports/` - Interface definitions for infrastructure
//!
//! ## Design Principles
//!
//! 1. **No direct I/O** - File access goes through the `FileSystem` port
//! 2. **Pure Functions** - Services are stateless and testable
//! 3. **Ports & Adapters** - Parsers, synthesizers and watchers are trait-defined

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
