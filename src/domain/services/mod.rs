//! Domain Services
//!
//! Pure business logic services that operate on domain entities.
//! File access goes through the `FileSystem` port only.

mod closure;
mod staleness;

pub use closure::{compute_closure, DeclarationGraph};
pub use staleness::{StalenessChecker, Verdict};
