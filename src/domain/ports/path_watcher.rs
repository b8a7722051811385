//! Path watcher port
//!
//! The coordinator extends the live watch surface through this trait; the
//! notify-backed implementation lives in infrastructure.

use std::path::Path;

use crate::error::RegenResult;

pub trait PathWatcher {
    /// Watch a single file
    fn add(&mut self, path: &Path) -> RegenResult<()>;

    /// Watch a directory tree
    fn add_recursive(&mut self, dir: &Path) -> RegenResult<()>;
}
