//! Output Rendering
//!
//! Renders rebuild reports, route status and route listings as text or JSON.
//! Renderers return strings; commands decide where they go.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::{json, Value};

use crate::application::RebuildReport;
use crate::domain::entities::{normalize_relative_path, Route};
use crate::domain::services::Verdict;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

struct Icons {
    check: &'static str,
    cross: &'static str,
    write: &'static str,
    warn: &'static str,
}

const ICONS: Icons = Icons {
    check: "✓",
    cross: "✗",
    write: "→",
    warn: "!",
};

fn verdict_label(verdict: &Verdict) -> String {
    match verdict {
        Verdict::UpToDate => "up to date".to_string(),
        Verdict::SourceChanged => "source changed".to_string(),
        Verdict::DependencyChanged(dep) => format!("dependency changed: {dep}"),
        Verdict::DependencyMissing(dep) => format!("dependency missing: {dep}"),
    }
}

/// Summary of one `generate` run
pub fn render_report(report: &RebuildReport, root: &Path, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "command": "generate",
                "success": report.is_success(),
                "rebuilt": report.rebuilt,
                "up_to_date": report.up_to_date,
                "failed": report
                    .failed
                    .iter()
                    .map(|(route, message)| json!({ "route": route, "message": message }))
                    .collect::<Vec<Value>>(),
                "written": report
                    .written
                    .iter()
                    .map(|path| normalize_relative_path(root, path))
                    .collect::<Vec<_>>(),
                "diagnostics": report.diagnostics,
            });
            value.to_string()
        }
        OutputFormat::Text => render_report_text(report, root),
    }
}

fn render_report_text(report: &RebuildReport, root: &Path) -> String {
    let mut out = String::new();

    if report.is_success() && report.rebuilt.is_empty() {
        let _ = writeln!(out, "{} Already up-to-date", ICONS.check);
        let _ = writeln!(out, "  {} routes checked", report.up_to_date.len());
        return out;
    }

    if report.is_success() {
        let _ = writeln!(out, "{} Generation complete", ICONS.check);
    } else {
        let _ = writeln!(out, "{} Generation failed", ICONS.cross);
    }
    let _ = writeln!(
        out,
        "  {} rebuilt, {} up to date, {} failed",
        report.rebuilt.len(),
        report.up_to_date.len(),
        report.failed.len()
    );

    if !report.written.is_empty() {
        let _ = writeln!(out, "  Written ({}):", report.written.len());
        for path in &report.written {
            let _ = writeln!(out, "    {} {}", ICONS.write, normalize_relative_path(root, path));
        }
    }
    if !report.failed.is_empty() {
        let _ = writeln!(out, "  Failed ({}):", report.failed.len());
        for (route, message) in &report.failed {
            let _ = writeln!(out, "    {} {route}: {message}", ICONS.cross);
        }
    }
    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "  Diagnostics ({}):", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            let _ = writeln!(out, "    {} {diagnostic}", ICONS.warn);
        }
    }
    out
}

/// Staleness of each route
pub fn render_status(statuses: &[(String, Verdict)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let routes: Vec<Value> = statuses
                .iter()
                .map(|(route, verdict)| {
                    json!({
                        "route": route,
                        "stale": verdict.is_stale(),
                        "reason": verdict_label(verdict),
                    })
                })
                .collect();
            json!({ "command": "status", "routes": routes }).to_string()
        }
        OutputFormat::Text => {
            let width = statuses.iter().map(|(route, _)| route.len()).max().unwrap_or(0);
            let mut out = String::new();
            for (route, verdict) in statuses {
                let icon = if verdict.is_stale() { ICONS.cross } else { ICONS.check };
                let _ = writeln!(out, "{icon} {route:<width$}  {}", verdict_label(verdict));
            }
            let stale = statuses.iter().filter(|(_, v)| v.is_stale()).count();
            let _ = writeln!(out, "{stale} of {} routes stale", statuses.len());
            out
        }
    }
}

/// Routes with their source module and root type expressions
pub fn render_routes(routes: &[Route], root: &Path, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let routes: Vec<Value> = routes
                .iter()
                .map(|route| {
                    let roots: serde_json::Map<String, Value> = route
                        .roots()
                        .iter()
                        .map(|(role, text)| (role.suffix().to_lowercase(), json!(text)))
                        .collect();
                    json!({
                        "id": route.id(),
                        "source": normalize_relative_path(root, route.source_file()),
                        "roots": roots,
                    })
                })
                .collect();
            json!({ "command": "routes", "routes": routes }).to_string()
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for route in routes {
                let _ = writeln!(
                    out,
                    "{} ({})",
                    route.id(),
                    normalize_relative_path(root, route.source_file())
                );
                for (role, text) in route.roots().iter() {
                    let _ = writeln!(out, "  {}: {text}", role.suffix().to_lowercase());
                }
            }
            out
        }
    }
}
