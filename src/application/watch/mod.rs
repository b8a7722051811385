//! Watch Coordinator
//!
//! Continuous regeneration of route artifacts. It orchestrates:
//! - File system monitoring (via `notify`, behind the `PathWatcher` port)
//! - Debouncing (100ms default) and content-hash filtering
//! - Re-reading changed route modules (added and removed routes)
//! - Rebuilding the dependents of changed dependency files
//! - Growing the Watch Set as workers report new dependencies
//!
//! ## Usage
//!
//! ```ignore
//! let mut coordinator = WatchCoordinator::new(options, registry, scheduler, fs, NotifyWatcher::new()?);
//! coordinator.run(running, |event| println!("{}", event.to_line()))?;
//! ```

mod coordinator;
mod event;
mod watch_set;

#[cfg(test)]
mod tests;

pub use coordinator::{ChangeOutcome, WatchCoordinator, WatchOptions};
pub use event::{WatchEvent, WatcherState, DEBOUNCE_MS};
pub use watch_set::WatchSet;
