//! Type-closure fixed point
//!
//! Marks the minimal set of declarations needed to describe a route's root
//! type expressions.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entities::{DiscoveredDeclaration, TypeDeclaration};

/// Candidate declarations plus the resolved target of each of their references
///
/// Nodes are identified by index; two candidates may share a name when they
/// come from different modules. A reference with no edge names something
/// outside the candidate set (a builtin, or an import that was not followed).
#[derive(Debug, Clone, Default)]
pub struct DeclarationGraph {
    declarations: Vec<TypeDeclaration>,
    edges: Vec<BTreeMap<String, usize>>,
}

impl DeclarationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single scope: every reference resolves to the first candidate of
    /// that name.
    pub fn by_name(declarations: Vec<TypeDeclaration>) -> Self {
        let mut graph = Self::new();
        for declaration in declarations {
            graph.add(declaration);
        }
        for from in 0..graph.len() {
            let targets: Vec<(String, usize)> = graph.declarations[from]
                .references()
                .iter()
                .filter_map(|name| graph.find(name).map(|to| (name.clone(), to)))
                .collect();
            for (name, to) in targets {
                graph.link(from, name, to);
            }
        }
        graph
    }

    pub fn add(&mut self, declaration: TypeDeclaration) -> usize {
        self.declarations.push(declaration);
        self.edges.push(BTreeMap::new());
        self.declarations.len() - 1
    }

    /// Resolve reference `name` of candidate `from` to candidate `to`
    pub fn link(&mut self, from: usize, name: impl Into<String>, to: usize) {
        if let Some(edges) = self.edges.get_mut(from) {
            edges.insert(name.into(), to);
        }
    }

    /// First candidate declared as `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.declarations.iter().position(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn declaration(&self, index: usize) -> Option<&TypeDeclaration> {
        self.declarations.get(index)
    }

    /// Resolved references of one candidate, by referenced name
    pub fn edges(&self, index: usize) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.edges
            .get(index)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(name, to)| (name.as_str(), *to)))
    }
}

/// Compute closure membership for the candidates of `graph`.
///
/// `roots` holds the candidates referenced by the root expressions; they sit
/// at depth 0. Each further pass includes the targets of the set included so
/// far, one hop deeper, until a pass adds nothing or `max_depth` is reached.
/// Generic declarations are never included, and their references are
/// therefore never followed.
///
/// Output order matches candidate order.
pub fn compute_closure(
    graph: &DeclarationGraph,
    roots: &BTreeSet<usize>,
    max_depth: usize,
) -> Vec<DiscoveredDeclaration> {
    let mut discovered: Vec<DiscoveredDeclaration> = graph
        .declarations
        .iter()
        .cloned()
        .map(DiscoveredDeclaration::excluded)
        .collect();

    for &root in roots {
        if let Some(item) = discovered.get_mut(root) {
            if !item.declaration().is_generic() {
                item.include_at(0);
            }
        }
    }

    for depth in 1..=max_depth {
        let referenced: BTreeSet<usize> = discovered
            .iter()
            .enumerate()
            .filter(|(_, d)| d.included())
            .flat_map(|(index, _)| graph.edges(index).map(|(_, to)| to))
            .collect();

        let mut added = 0;
        for index in referenced {
            let Some(item) = discovered.get_mut(index) else {
                continue;
            };
            if item.included() || item.declaration().is_generic() {
                continue;
            }
            item.include_at(depth);
            added += 1;
        }

        if added == 0 {
            break;
        }
    }

    discovered
}
