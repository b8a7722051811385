//! Type declarations extracted from source modules
//!
//! A declaration is immutable once extracted; whenever its owning file changes
//! the whole module is re-extracted.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Syntactic form of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    TypeAlias,
    Interface,
}

/// A named type alias or interface found in a parsed module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    file: PathBuf,
    name: String,
    kind: DeclarationKind,
    /// Literal text starting at the `type` / `interface` keyword
    text: String,
    /// Literal `<...>` parameter list, if the declaration is generic
    type_params: Option<String>,
    /// Names referenced anywhere inside the declaration (direct references only)
    references: BTreeSet<String>,
    /// Byte range of the declared name within `text`
    name_span: Option<Range<usize>>,
    /// Byte ranges of every reference occurrence within `text`
    reference_spans: Vec<Range<usize>>,
}

impl TypeDeclaration {
    pub fn new(
        file: impl Into<PathBuf>,
        name: impl Into<String>,
        kind: DeclarationKind,
        text: impl Into<String>,
        references: BTreeSet<String>,
    ) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            kind,
            text: text.into(),
            type_params: None,
            references,
            name_span: None,
            reference_spans: Vec::new(),
        }
    }

    /// Record where the name and each reference occur, so the declaration can
    /// be emitted under other names
    pub fn with_spans(mut self, name_span: Range<usize>, reference_spans: Vec<Range<usize>>) -> Self {
        self.name_span = Some(name_span);
        self.reference_spans = reference_spans;
        self
    }

    pub fn with_type_params(mut self, type_params: impl Into<String>) -> Self {
        self.type_params = Some(type_params.into());
        self
    }

    /// Synthetic `type local = imported;` alias standing in for a renamed import
    pub fn import_alias(file: impl Into<PathBuf>, local: &str, imported: &str) -> Self {
        let name_start = "type ".len();
        let target_start = name_start + local.len() + " = ".len();
        Self::new(
            file,
            local,
            DeclarationKind::TypeAlias,
            format!("type {local} = {imported};"),
            BTreeSet::from([imported.to_string()]),
        )
        .with_spans(
            name_start..name_start + local.len(),
            vec![target_start..target_start + imported.len()],
        )
    }

    /// Module that declares this type
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn type_params(&self) -> Option<&str> {
        self.type_params.as_deref()
    }

    pub fn references(&self) -> &BTreeSet<String> {
        &self.references
    }

    pub fn references_name(&self, name: &str) -> bool {
        self.references.contains(name)
    }

    /// Generic declarations cannot be represented by the schema synthesizer
    pub fn is_generic(&self) -> bool {
        self.type_params.is_some()
    }

    /// Self-contained exported form of the declaration
    pub fn emitted(&self) -> String {
        self.exported(&self.text)
    }

    /// Exported form declared as `name`, with references renamed through
    /// `renames`. Without recorded spans the text is left as is.
    pub fn emitted_as(&self, name: &str, renames: &BTreeMap<String, String>) -> String {
        let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
        if let Some(span) = self.name_span.clone().filter(|_| name != self.name) {
            edits.push((span, name));
        }
        for span in &self.reference_spans {
            let Some(original) = self.text.get(span.clone()) else {
                continue;
            };
            if let Some(renamed) = renames.get(original) {
                edits.push((span.clone(), renamed.as_str()));
            }
        }
        if edits.is_empty() {
            return self.emitted();
        }

        edits.sort_by_key(|(span, _)| span.start);
        let mut text = String::with_capacity(self.text.len());
        let mut cursor = 0;
        for (span, replacement) in edits {
            if span.start < cursor {
                continue;
            }
            text.push_str(self.text.get(cursor..span.start).unwrap_or_default());
            text.push_str(replacement);
            cursor = span.end;
        }
        text.push_str(self.text.get(cursor..).unwrap_or_default());
        self.exported(&text)
    }

    fn exported(&self, text: &str) -> String {
        let text = text.trim_end();
        match self.kind {
            DeclarationKind::TypeAlias if !text.ends_with(';') => format!("export {text};"),
            _ => format!("export {text}"),
        }
    }
}

/// A declaration annotated with its membership in one route's closure
///
/// The annotation is recomputed on every discovery pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDeclaration {
    declaration: TypeDeclaration,
    included: bool,
    depth: Option<usize>,
}

impl DiscoveredDeclaration {
    pub fn excluded(declaration: TypeDeclaration) -> Self {
        Self {
            declaration,
            included: false,
            depth: None,
        }
    }

    pub(crate) fn include_at(&mut self, depth: usize) {
        self.included = true;
        self.depth = Some(depth);
    }

    pub fn declaration(&self) -> &TypeDeclaration {
        &self.declaration
    }

    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    pub fn included(&self) -> bool {
        self.included
    }

    /// Number of reference hops from the roots, for included declarations
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }
}
