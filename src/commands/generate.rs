use anyhow::{bail, Context, Result};
use tracing::warn;

use routegen::presentation::output::render_report;
use routegen::presentation::{create_pipeline, OutputFormat, Project};

pub fn cmd_generate(project: &Project, format: OutputFormat) -> Result<()> {
    let pipeline = create_pipeline(project);
    let scan = pipeline.registry.scan().context("cannot scan routes")?;

    let mut report = pipeline
        .scheduler
        .rebuild(&scan.routes)
        .context("rebuild aborted")?;
    for diagnostic in scan.diagnostics {
        warn!("{diagnostic}");
        report.diagnostics.push(diagnostic);
    }

    print!("{}", render_report(&report, project.root(), format));
    if format == OutputFormat::Json {
        println!();
    }

    if !report.is_success() {
        bail!("{} route(s) failed to generate", report.failed.len());
    }
    Ok(())
}
