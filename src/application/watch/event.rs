//! Watch event types and debouncing

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::application::scheduler::RebuildReport;

/// Default debounce duration in milliseconds
pub const DEBOUNCE_MS: u64 = 100;

/// Watch event types for NDJSON output
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    /// Watch started
    WatchStarted { routes_dir: String, routes: usize },
    /// Source or dependency file changed
    FileChanged { path: String },
    /// Rebuild of the affected routes started
    RebuildStarted { routes: Vec<String> },
    /// Rebuild finished
    RebuildComplete {
        rebuilt: usize,
        up_to_date: usize,
        failed: usize,
        written: usize,
    },
    /// One route could not be regenerated
    RouteFailed { route: String, message: String },
    /// A route's declaration disappeared from its source file
    RouteRemoved { route: String },
    /// A file joined the watch set
    DependencyAdded { path: String, route: String },
    /// Error occurred
    Error { message: String },
    /// Watch stopped
    Shutdown,
}

impl WatchEvent {
    /// Convert to JSON string with "command": "watch" field included
    pub fn to_json(&self) -> String {
        let mut value =
            serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"event": "error"}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert("command".to_string(), serde_json::json!("watch"));
        }
        serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Human-readable single line
    pub fn to_line(&self) -> String {
        match self {
            WatchEvent::WatchStarted { routes_dir, routes } => {
                format!("watching {routes_dir} ({routes} routes)")
            }
            WatchEvent::FileChanged { path } => format!("changed: {path}"),
            WatchEvent::RebuildStarted { routes } => format!("rebuilding {}", routes.join(", ")),
            WatchEvent::RebuildComplete {
                rebuilt,
                up_to_date,
                failed,
                written,
            } => format!(
                "rebuilt {rebuilt}, up to date {up_to_date}, failed {failed}, {written} files written"
            ),
            WatchEvent::RouteFailed { route, message } => format!("route {route} failed: {message}"),
            WatchEvent::RouteRemoved { route } => format!("route {route} removed"),
            WatchEvent::DependencyAdded { path, route } => format!("watching {path} (for {route})"),
            WatchEvent::Error { message } => format!("error: {message}"),
            WatchEvent::Shutdown => "stopped".to_string(),
        }
    }

    /// Summary event for a finished rebuild
    pub fn rebuild_complete(report: &RebuildReport) -> Self {
        WatchEvent::RebuildComplete {
            rebuilt: report.rebuilt.len(),
            up_to_date: report.up_to_date.len(),
            failed: report.failed.len(),
            written: report.written.len(),
        }
    }
}

/// Watcher state for debouncing
#[derive(Debug)]
pub struct WatcherState {
    pending_changes: HashSet<PathBuf>,
    last_change: Option<Instant>,
    debounce: Duration,
}

impl Default for WatcherState {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherState {
    pub fn new() -> Self {
        Self::with_debounce(Duration::from_millis(DEBOUNCE_MS))
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            pending_changes: HashSet::new(),
            last_change: None,
            debounce,
        }
    }

    /// Add a file change to pending changes
    pub fn add_change(&mut self, path: PathBuf) {
        self.pending_changes.insert(path);
        self.last_change = Some(Instant::now());
    }

    /// Check if debounce period has passed and we have pending changes
    pub fn should_sync(&self) -> bool {
        match self.last_change {
            Some(last) => !self.pending_changes.is_empty() && last.elapsed() >= self.debounce,
            None => false,
        }
    }

    /// Take all pending changes, sorted, resetting state
    pub fn take_changes(&mut self) -> Vec<PathBuf> {
        let mut changes: Vec<_> = self.pending_changes.drain().collect();
        changes.sort();
        self.last_change = None;
        changes
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_changes.is_empty()
    }
}
