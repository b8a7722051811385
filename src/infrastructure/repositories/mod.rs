//! Repository Implementations
//!
//! Concrete persistence for generated per-route records.

mod hash_map;

pub use hash_map::{HashMapError, JsonHashMapRepository};
