//! Subcommand implementations

pub mod generate;
pub mod routes;
pub mod status;
pub mod watch;
