//! notify-backed `PathWatcher`
//!
//! Single files are watched through their parent directory so editors that
//! save by rename-over do not silently drop the watch. Unrelated events from
//! that directory are filtered out by the watch coordinator.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::domain::ports::path_watcher::PathWatcher;
use crate::error::{RegenError, RegenResult};

pub struct NotifyWatcher {
    watcher: RecommendedWatcher,
    events: Receiver<PathBuf>,
    recursive: Vec<PathBuf>,
    directories: HashSet<PathBuf>,
}

fn notify_error(e: notify::Error) -> RegenError {
    RegenError::Io(std::io::Error::other(e.to_string()))
}

impl NotifyWatcher {
    pub fn new() -> RegenResult<Self> {
        let (tx, rx) = channel();
        let watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if event.kind.is_access() {
                        return;
                    }
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            },
            Config::default(),
        )
        .map_err(notify_error)?;

        Ok(Self {
            watcher,
            events: rx,
            recursive: Vec::new(),
            directories: HashSet::new(),
        })
    }

    /// Next changed path, or `None` if nothing arrived within `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PathBuf> {
        match self.events.recv_timeout(timeout) {
            Ok(path) => Some(path),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn covered(&self, dir: &Path) -> bool {
        self.directories.contains(dir) || self.recursive.iter().any(|root| dir.starts_with(root))
    }
}

impl PathWatcher for NotifyWatcher {
    fn add(&mut self, path: &Path) -> RegenResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if self.covered(&dir) {
            return Ok(());
        }
        self.watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(notify_error)?;
        debug!(dir = %dir.display(), file = %path.display(), "watching dependency directory");
        self.directories.insert(dir);
        Ok(())
    }

    fn add_recursive(&mut self, dir: &Path) -> RegenResult<()> {
        if self.recursive.iter().any(|root| dir.starts_with(root)) {
            return Ok(());
        }
        self.watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(notify_error)?;
        debug!(dir = %dir.display(), "watching directory tree");
        self.recursive.push(dir.to_path_buf());
        Ok(())
    }
}
