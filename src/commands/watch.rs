use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use routegen::presentation::{create_pipeline, Project};

pub fn cmd_watch(project: &Project, json: bool) -> Result<()> {
    let mut coordinator = create_pipeline(project)
        .into_watch_coordinator()
        .context("cannot start file watcher")?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .context("cannot install Ctrl+C handler")?;

    if !json {
        println!("routegen watch: {}", project.routes_dir().display());
        println!("Press Ctrl+C to stop\n");
    }

    coordinator
        .run(running, |event| {
            if json {
                println!("{}", event.to_json());
            } else {
                println!("{}", event.to_line());
            }
        })
        .context("watch stopped")?;
    Ok(())
}
