//! Configuration type definitions

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RegenResult;

use super::loader::{self, ConfigWarning};

/// Where route modules live and how routes are declared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_routes_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Name of the route factory call (`export const x = route<...>(...)`)
    #[serde(default = "default_factory")]
    pub factory: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            dir: default_routes_dir(),
            extensions: default_extensions(),
            factory: default_factory(),
        }
    }
}

fn default_routes_dir() -> PathBuf {
    PathBuf::from("src/routes")
}

fn default_extensions() -> Vec<String> {
    vec!["ts".to_string(), "tsx".to_string()]
}

fn default_factory() -> String {
    crate::infrastructure::parser::DEFAULT_FACTORY.to_string()
}

/// Generated output location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".routegen")
}

/// Type discovery limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum number of import hops followed from a route module
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    8
}

/// Rebuild scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchedulerConfig {
    /// Concurrent workers per batch; 0 means one per available CPU
    #[serde(default)]
    pub jobs: usize,
}

/// Watch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    crate::application::watch::DEBOUNCE_MS
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub routes: RoutesConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> RegenResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> RegenResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Project configuration for `root` with environment overrides applied.
    ///
    /// An explicit `config_file` must exist; the implicit `routegen.toml`
    /// is optional.
    pub fn resolve(root: &Path, config_file: Option<&Path>) -> RegenResult<(Self, Vec<ConfigWarning>)> {
        loader::resolve(root, config_file)
    }

    /// Apply environment variable overrides (ROUTEGEN_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Routes directory, resolved against the project root
    pub fn routes_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.routes.dir)
    }

    /// Output directory, resolved against the project root
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output.dir)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}
