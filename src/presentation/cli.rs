//! CLI Argument Parsing
//!
//! Global flags (`--json`, `--verbose`, `--root`, `--config`) are inherited by
//! all subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// routegen - incremental route schema generation
#[derive(Parser, Debug)]
#[command(name = "routegen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file (defaults to <root>/routegen.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Regenerate every stale route once
    Generate {
        /// Concurrent workers per batch (0 = one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Maximum import hops followed during type discovery
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Regenerate, then keep regenerating on changes until Ctrl+C
    Watch {
        /// Concurrent workers per batch (0 = one per CPU)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show which routes are stale
    Status,

    /// List discovered routes and their root types
    Routes,
}
