//! Configuration module for routegen
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (ROUTEGEN_*)
//! 3. Project config (routegen.toml at the project root)
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{ConfigWarning, CONFIG_FILE};
pub use types::{
    Config, DiscoveryConfig, OutputConfig, RoutesConfig, SchedulerConfig, WatchConfig,
};
