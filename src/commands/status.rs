use anyhow::{Context, Result};

use routegen::presentation::output::render_status;
use routegen::presentation::{create_pipeline, OutputFormat, Project};

pub fn cmd_status(project: &Project, format: OutputFormat) -> Result<()> {
    let pipeline = create_pipeline(project);
    let scan = pipeline.registry.scan().context("cannot scan routes")?;
    let statuses = pipeline.scheduler.status(&scan.routes);

    let rendered = render_status(&statuses, format);
    if format == OutputFormat::Json {
        println!("{rendered}");
    } else {
        print!("{rendered}");
    }
    Ok(())
}
