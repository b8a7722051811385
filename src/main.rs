//! routegen CLI - incremental route schema generation
//!
//! Usage: routegen [--json] [-v...] [--root DIR] [--config FILE] <COMMAND>
//!
//! Commands:
//!   generate  Regenerate every stale route once
//!   watch     Regenerate continuously on changes
//!   status    Show which routes are stale
//!   routes    List discovered routes

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use routegen::presentation::{Cli, Commands, OutputFormat, Project};

mod commands;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "routegen=info",
        1 => "routegen=debug",
        _ => "routegen=trace",
    };
    let filter = EnvFilter::try_from_env("ROUTEGEN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    let (mut project, warnings) = Project::load(&root, cli.config.as_deref())
        .with_context(|| format!("cannot load project at {}", root.display()))?;
    for warning in &warnings {
        warn!("{warning}");
    }
    let format = OutputFormat::from_json_flag(cli.json);

    match cli.command {
        Commands::Generate { jobs, max_depth } => {
            if let Some(jobs) = jobs {
                project.config.scheduler.jobs = jobs;
            }
            if let Some(max_depth) = max_depth {
                project.config.discovery.max_depth = max_depth;
            }
            commands::generate::cmd_generate(&project, format)
        }
        Commands::Watch { jobs } => {
            if let Some(jobs) = jobs {
                project.config.scheduler.jobs = jobs;
            }
            commands::watch::cmd_watch(&project, cli.json)
        }
        Commands::Status => commands::status::cmd_status(&project, format),
        Commands::Routes => commands::routes::cmd_routes(&project, format),
    }
}
