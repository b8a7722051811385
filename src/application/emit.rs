//! Artifact rendering
//!
//! Pure functions from discovery and synthesis results to file contents.
//! Output must be byte-stable for identical inputs, otherwise the write guard
//! could never skip a write.

use crate::domain::entities::Route;
use crate::domain::ports::schema_synthesizer::Synthesis;

use super::discovery::Discovery;

fn header(source: &str) -> String {
    format!("// @generated by routegen from {source}. Do not edit.\n")
}

/// Contents of `types.d.ts`: the normalized closure plus root aliases
pub fn render_types(source: &str, discovery: &Discovery) -> String {
    let mut out = header(source);
    let closure = discovery.closure_text();
    if !closure.is_empty() {
        out.push('\n');
        out.push_str(&closure);
    }
    out
}

/// Contents of `schema.gen.ts`
///
/// A failed synthesis still produces an artifact: the schema is `null` and
/// every error is listed as a comment above it.
pub fn render_artifact(
    route: &Route,
    source: &str,
    discovery: &Discovery,
    synthesis: &Synthesis,
) -> String {
    let mut out = header(source);
    out.push('\n');

    let aliases: Vec<&str> = discovery.roots().iter().map(|r| r.name.as_str()).collect();
    if !aliases.is_empty() {
        out.push_str(&format!(
            "export type {{ {} }} from \"./types\";\n\n",
            aliases.join(", ")
        ));
    }

    let diagnostics: Vec<&String> = discovery
        .diagnostics()
        .iter()
        .chain(synthesis.errors.iter())
        .collect();
    if !diagnostics.is_empty() {
        out.push_str("// diagnostics:\n");
        for diagnostic in diagnostics {
            for (i, line) in diagnostic.lines().enumerate() {
                let bullet = if i == 0 { "- " } else { "  " };
                out.push_str(&format!("// {bullet}{line}\n"));
            }
        }
    }

    let name = format!("{}Schema", route.id());
    match synthesis.schema_text.as_deref() {
        Some(schema) if synthesis.is_success() => {
            out.push_str(&format!("export const {name} = {} as const;\n", schema.trim_end()));
        }
        _ => out.push_str(&format!("export const {name} = null;\n")),
    }
    out
}
