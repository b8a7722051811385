//! Thin layer over the tree-sitter TypeScript grammars
//!
//! Shared by the module parser and the schema synthesizer.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

/// Grammar flavour, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    fn language(self) -> Language {
        match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// First syntax problem of a source text, on a 1-based line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// Parse `text`, rejecting trees that contain error or missing nodes.
pub fn parse(text: &str, dialect: Dialect) -> Result<Tree, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&dialect.language())
        .map_err(|e| SyntaxError {
            line: 0,
            message: format!("cannot load TypeScript grammar: {e}"),
        })?;
    let tree = parser.parse(text, None).ok_or_else(|| SyntaxError {
        line: 0,
        message: "parser produced no syntax tree".to_string(),
    })?;

    if let Some(node) = first_error(tree.root_node()) {
        let message = if node.is_missing() {
            format!("expected '{}'", node.kind())
        } else {
            let near = excerpt(text, node);
            if near.is_empty() {
                "syntax error".to_string()
            } else {
                format!("syntax error near '{near}'")
            }
        };
        return Err(SyntaxError {
            line: node.start_position().row + 1,
            message,
        });
    }
    Ok(tree)
}

fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

pub fn text<'s>(source: &'s str, node: Node<'_>) -> &'s str {
    source.get(node.byte_range()).unwrap_or_default()
}

/// First line of a node's text, shortened for messages
pub fn excerpt(source: &str, node: Node<'_>) -> String {
    let line = text(source, node).lines().next().unwrap_or_default().trim();
    let mut short: String = line.chars().take(32).collect();
    if short.len() < line.len() {
        short.push_str("...");
    }
    short
}

pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let nodes: Vec<Node<'t>> = node.children(&mut cursor).collect();
    nodes
}

/// Named children without comments
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let nodes: Vec<Node<'t>> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    nodes
}

/// Whether `node` has an anonymous `token` child, e.g. `type` or `?`
pub fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|child| !child.is_named() && child.kind() == token)
}

/// The declaration behind `export` / `declare` wrappers of a top-level statement
pub fn declaration_of(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "export_statement" => node.child_by_field_name("declaration").and_then(declaration_of),
        "ambient_declaration" => named_children(node).into_iter().find_map(declaration_of),
        "type_alias_declaration" | "interface_declaration" | "lexical_declaration" => Some(node),
        _ => None,
    }
}

/// Strip the quotes of a string literal
pub fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix(['"', '\''])
        .and_then(|s| s.strip_suffix(['"', '\'']))
        .unwrap_or(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(match next {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
            }
        } else {
            out.push(c);
        }
    }
    out
}
