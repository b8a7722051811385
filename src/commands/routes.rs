use anyhow::{Context, Result};
use tracing::warn;

use routegen::presentation::output::render_routes;
use routegen::presentation::{create_pipeline, OutputFormat, Project};

pub fn cmd_routes(project: &Project, format: OutputFormat) -> Result<()> {
    let pipeline = create_pipeline(project);
    let scan = pipeline.registry.scan().context("cannot scan routes")?;
    for diagnostic in &scan.diagnostics {
        warn!("{diagnostic}");
    }

    let rendered = render_routes(&scan.routes, project.root(), format);
    if format == OutputFormat::Json {
        println!("{rendered}");
    } else {
        print!("{rendered}");
    }
    Ok(())
}
