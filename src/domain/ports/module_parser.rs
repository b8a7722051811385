//! Module parser port
//!
//! Turns the text of one source module into its top-level type declarations,
//! type-only imports and route declarations. This is a structural scan, not
//! a type checker.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::entities::TypeDeclaration;

/// Source text could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{line}: {message}", .file.display())]
pub struct ParseError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(file: &Path, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// One name brought in by a type-only import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// Name exported by the imported module
    pub imported: String,
    /// Name bound in the importing module
    pub local: String,
}

impl ImportedName {
    pub fn is_renamed(&self) -> bool {
        self.imported != self.local
    }
}

/// A type-only import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeImport {
    /// Module specifier as written, e.g. `./models`
    pub specifier: String,
    pub names: Vec<ImportedName>,
}

impl TypeImport {
    /// Only relative specifiers can be resolved on the local filesystem
    pub fn is_relative(&self) -> bool {
        self.specifier.starts_with("./") || self.specifier.starts_with("../")
    }
}

/// An exported route binding, e.g. `export const orders = route<P, B, R>(...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDeclaration {
    pub name: String,
    /// Literal generic arguments in positional order
    pub type_args: Vec<String>,
    /// 1-based line of the declaration
    pub line: usize,
}

/// Everything the parser extracts from one module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedModule {
    pub declarations: Vec<TypeDeclaration>,
    pub imports: Vec<TypeImport>,
    pub routes: Vec<RouteDeclaration>,
}

impl ParsedModule {
    pub fn route(&self, name: &str) -> Option<&RouteDeclaration> {
        self.routes.iter().find(|r| r.name == name)
    }
}

/// Parser of handler source modules
pub trait ModuleParser: Send + Sync {
    /// Scan a whole module
    fn parse(&self, file: &Path, text: &str) -> Result<ParsedModule, ParseError>;

    /// Type names referenced by a standalone type expression
    fn references(&self, type_text: &str) -> BTreeSet<String>;
}
