//! Application Layer
//!
//! Orchestration of the generation pipeline.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Components
//!
//! - `TypeClosureDiscoverer` - Finds the declarations a route's roots need
//! - `emit` - Renders the intermediate and final artifacts
//! - `worker` - Typed worker requests/messages and the worker body
//! - `RebuildScheduler` - Batched, isolated regeneration of stale routes
//! - `WatchCoordinator` - Watch Set maintenance and change handling

pub mod discovery;
pub mod emit;
pub mod scheduler;
pub mod watch;
pub mod worker;

pub use discovery::{Discovery, RootAlias, TypeClosureDiscoverer};
pub use scheduler::{resolve_jobs, RebuildReport, RebuildScheduler};
pub use watch::{ChangeOutcome, WatchCoordinator, WatchEvent, WatchOptions, WatchSet};
pub use worker::{WorkerContext, WorkerMessage, WorkerRequest};
