//! Type-Closure Discoverer
//!
//! Starting from a route's source module, collects every top-level type
//! declaration reachable through type-only imports and marks the minimal
//! closure needed by the route's root type expressions.
//!
//! Candidates are identified by owning module and name. Each reference is
//! resolved through the scope of the module that contains it: local
//! declarations first, then the declaration an import binding points at.
//! Distinct declarations that share a name are emitted under unique names.
//!
//! Discovery never fails hard: a missing or unparseable module contributes
//! nothing and leaves a diagnostic behind.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::entities::{DiscoveredDeclaration, RootRole, Route, TypeDeclaration};
use crate::domain::ports::file_system::FileSystem;
use crate::domain::ports::module_parser::{ModuleParser, ParsedModule};
use crate::domain::services::{compute_closure, DeclarationGraph};

/// Extensions tried, in order, when resolving an import specifier
const RESOLVE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".d.ts", "/index.ts", "/index.tsx"];

/// A root alias generated for one role of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAlias {
    pub role: RootRole,
    pub name: String,
    pub text: String,
}

impl RootAlias {
    pub fn emitted(&self) -> String {
        format!("export type {} = {};", self.name, self.text)
    }
}

/// Result of one discovery pass for one route
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    declarations: Vec<DiscoveredDeclaration>,
    /// Exported text of each included declaration, in candidate order
    emitted: Vec<String>,
    roots: Vec<RootAlias>,
    diagnostics: Vec<String>,
}

impl Discovery {
    fn empty(diagnostic: String) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            ..Self::default()
        }
    }

    /// Every candidate, annotated with closure membership
    pub fn declarations(&self) -> &[DiscoveredDeclaration] {
        &self.declarations
    }

    pub fn included(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations
            .iter()
            .filter(|d| d.included())
            .map(DiscoveredDeclaration::declaration)
    }

    pub fn roots(&self) -> &[RootAlias] {
        &self.roots
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Normalized declarations of the closure followed by the root aliases
    pub fn closure_text(&self) -> String {
        let mut parts = self.emitted.clone();
        parts.extend(self.roots.iter().map(RootAlias::emitted));
        if parts.is_empty() {
            return String::new();
        }
        let mut text = parts.join("\n\n");
        text.push('\n');
        text
    }

    /// Files owning at least one included declaration
    pub fn dependency_files(&self) -> Vec<PathBuf> {
        self.included()
            .map(|d| d.file().to_path_buf())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// A module reached from the route source, with the resolved target of each
/// of its imports
struct LoadedModule {
    file: PathBuf,
    module: ParsedModule,
    targets: Vec<Option<PathBuf>>,
}

/// Top-level type names visible inside one module
#[derive(Default)]
struct Scope {
    /// Declarations and renamed-import aliases owned by the module
    locals: HashMap<String, usize>,
    /// Unrenamed type imports: local name to (module, exported name)
    imports: HashMap<String, (PathBuf, String)>,
}

type Scopes = HashMap<PathBuf, Scope>;

pub struct TypeClosureDiscoverer<'a> {
    fs: &'a dyn FileSystem,
    parser: &'a dyn ModuleParser,
    max_depth: usize,
}

impl<'a> TypeClosureDiscoverer<'a> {
    pub fn new(fs: &'a dyn FileSystem, parser: &'a dyn ModuleParser, max_depth: usize) -> Self {
        Self {
            fs,
            parser,
            max_depth,
        }
    }

    fn load(&self, file: &Path) -> Result<ParsedModule, String> {
        let text = self.fs.read(file).map_err(|e| e.to_string())?;
        self.parser.parse(file, &text).map_err(|e| e.to_string())
    }

    pub fn discover(&self, route: &Route) -> Discovery {
        let source = route.source_file();
        let module = match self.load(source) {
            Ok(module) => module,
            Err(message) => {
                warn!(route = route.id(), error = %message, "discovery degraded to empty result");
                return Discovery::empty(message);
            }
        };

        let mut diagnostics = Vec::new();
        let modules = self.collect_modules(source, module, &mut diagnostics);
        let (graph, scopes) = build_graph(modules);

        let roots: Vec<RootAlias> = route
            .roots()
            .iter()
            .map(|(role, text)| RootAlias {
                role,
                name: route.alias_name(role),
                text: text.to_string(),
            })
            .collect();
        let root_nodes: BTreeSet<usize> = roots
            .iter()
            .flat_map(|root| self.parser.references(&root.text))
            .filter_map(|name| lookup(&scopes, source, &name))
            .collect();

        let declarations = compute_closure(&graph, &root_nodes, self.max_depth);
        report_generics(&graph, &declarations, &root_nodes, &mut diagnostics);
        let emitted = emit_unique(&graph, &declarations, &root_nodes);

        debug!(
            route = route.id(),
            candidates = declarations.len(),
            included = emitted.len(),
            "discovery finished"
        );

        Discovery {
            declarations,
            emitted,
            roots,
            diagnostics,
        }
    }

    /// The route module plus every module reachable through type-only imports
    /// within `max_depth` hops, in breadth-first order.
    fn collect_modules(
        &self,
        source: &Path,
        module: ParsedModule,
        diagnostics: &mut Vec<String>,
    ) -> Vec<LoadedModule> {
        let mut loaded = Vec::new();
        let mut available = HashSet::from([source.to_path_buf()]);
        let mut visited = HashSet::from([source.to_path_buf()]);
        let mut queue = VecDeque::from([(source.to_path_buf(), module, 0usize)]);

        while let Some((file, module, hops)) = queue.pop_front() {
            let mut targets = Vec::with_capacity(module.imports.len());
            for import in &module.imports {
                if !import.is_relative() {
                    targets.push(None);
                    continue;
                }
                let Some(target) = self.resolve(&file, &import.specifier) else {
                    if hops < self.max_depth {
                        diagnostics.push(format!(
                            "{}: cannot resolve type import '{}'",
                            file.display(),
                            import.specifier
                        ));
                    }
                    targets.push(None);
                    continue;
                };
                if hops < self.max_depth && visited.insert(target.clone()) {
                    match self.load(&target) {
                        Ok(imported) => {
                            available.insert(target.clone());
                            queue.push_back((target.clone(), imported, hops + 1));
                        }
                        Err(message) => {
                            warn!(file = %target.display(), error = %message, "skipping unparseable import");
                            diagnostics.push(message);
                        }
                    }
                }
                targets.push(available.contains(&target).then_some(target));
            }
            loaded.push(LoadedModule {
                file,
                module,
                targets,
            });
        }

        loaded
    }

    fn resolve(&self, from: &Path, specifier: &str) -> Option<PathBuf> {
        let dir = from.parent().unwrap_or_else(|| Path::new(""));
        let base = normalize_lexically(&dir.join(specifier));

        if base.extension().is_some_and(|e| e == "ts" || e == "tsx") && self.fs.exists(&base) {
            return Some(base);
        }
        let stem = match specifier.strip_suffix(".js") {
            Some(stripped) => normalize_lexically(&dir.join(stripped)),
            None => base,
        };
        let stem = stem.to_string_lossy();
        RESOLVE_SUFFIXES
            .iter()
            .map(|suffix| PathBuf::from(format!("{stem}{suffix}")))
            .find(|candidate| self.fs.exists(candidate))
    }
}

/// Add every declaration as a candidate, then resolve each reference through
/// the scope of the module that contains it.
fn build_graph(modules: Vec<LoadedModule>) -> (DeclarationGraph, Scopes) {
    let mut graph = DeclarationGraph::new();
    let mut scopes = Scopes::new();
    let mut owned: Vec<(PathBuf, Vec<usize>)> = Vec::new();
    let mut aliases: Vec<(usize, PathBuf, String)> = Vec::new();

    for LoadedModule {
        file,
        module,
        targets,
    } in modules
    {
        let mut scope = Scope::default();
        let mut nodes = Vec::new();
        for declaration in module.declarations {
            let name = declaration.name().to_string();
            let node = graph.add(declaration);
            scope.locals.entry(name).or_insert(node);
            nodes.push(node);
        }
        for (import, target) in module.imports.iter().zip(targets) {
            for name in &import.names {
                if name.is_renamed() {
                    let node = graph.add(TypeDeclaration::import_alias(&file, &name.local, &name.imported));
                    scope.locals.entry(name.local.clone()).or_insert(node);
                    if let Some(target) = &target {
                        aliases.push((node, target.clone(), name.imported.clone()));
                    }
                } else if let Some(target) = &target {
                    scope
                        .imports
                        .entry(name.local.clone())
                        .or_insert_with(|| (target.clone(), name.imported.clone()));
                }
            }
        }
        scopes.insert(file.clone(), scope);
        owned.push((file, nodes));
    }

    let mut links = Vec::new();
    for (file, nodes) in &owned {
        for &node in nodes {
            let Some(declaration) = graph.declaration(node) else {
                continue;
            };
            for name in declaration.references() {
                if let Some(to) = lookup(&scopes, file, name) {
                    links.push((node, name.clone(), to));
                }
            }
        }
    }
    for (node, target, imported) in &aliases {
        if let Some(to) = lookup(&scopes, target, imported) {
            links.push((*node, imported.clone(), to));
        }
    }
    for (from, name, to) in links {
        graph.link(from, name, to);
    }

    (graph, scopes)
}

/// Resolve `name` as seen from `file`, following re-exported imports
fn lookup<'s>(scopes: &'s Scopes, file: &'s Path, name: &'s str) -> Option<usize> {
    let mut file = file;
    let mut name = name;
    // A chain of imports never revisits a module more than once per module
    for _ in 0..=scopes.len() {
        let scope = scopes.get(file)?;
        if let Some(&node) = scope.locals.get(name) {
            return Some(node);
        }
        let (next_file, next_name) = scope.imports.get(name)?;
        file = next_file.as_path();
        name = next_name.as_str();
    }
    None
}

/// Exported text of every included declaration. Names claimed by the roots'
/// own targets stay as written; any other included declaration whose name is
/// already taken becomes `Name_2`, `Name_3`, ... and references to it are
/// rewritten.
fn emit_unique(
    graph: &DeclarationGraph,
    declarations: &[DiscoveredDeclaration],
    roots: &BTreeSet<usize>,
) -> Vec<String> {
    let included: Vec<usize> = (0..declarations.len())
        .filter(|&i| declarations[i].included())
        .collect();
    let taken_by_source: HashSet<&str> = included
        .iter()
        .map(|&i| declarations[i].name())
        .collect();

    let mut names: HashMap<usize, String> = HashMap::new();
    let mut claimed: HashSet<String> = HashSet::new();
    let order = included
        .iter()
        .filter(|&&i| roots.contains(&i))
        .chain(included.iter().filter(|&&i| !roots.contains(&i)));
    for &node in order {
        let name = declarations[node].name();
        let unique = if claimed.contains(name) {
            (2..)
                .map(|k| format!("{name}_{k}"))
                .find(|candidate| !claimed.contains(candidate) && !taken_by_source.contains(candidate.as_str()))
                .unwrap_or_else(|| name.to_string())
        } else {
            name.to_string()
        };
        claimed.insert(unique.clone());
        names.insert(node, unique);
    }

    included
        .iter()
        .map(|&node| {
            let renames: BTreeMap<String, String> = graph
                .edges(node)
                .filter_map(|(reference, to)| {
                    let renamed = names.get(&to)?;
                    (renamed != reference).then(|| (reference.to_string(), renamed.clone()))
                })
                .collect();
            let declaration = declarations[node].declaration();
            let name = names.get(&node).map(String::as_str).unwrap_or(declaration.name());
            declaration.emitted_as(name, &renames)
        })
        .collect()
}

/// A generic declaration the closure needed but had to leave out
fn report_generics(
    graph: &DeclarationGraph,
    declarations: &[DiscoveredDeclaration],
    roots: &BTreeSet<usize>,
    diagnostics: &mut Vec<String>,
) {
    let wanted: BTreeSet<usize> = declarations
        .iter()
        .enumerate()
        .filter(|(_, d)| d.included())
        .flat_map(|(index, _)| graph.edges(index).map(|(_, to)| to))
        .chain(roots.iter().copied())
        .collect();
    for index in wanted {
        let Some(decl) = graph.declaration(index) else {
            continue;
        };
        if decl.is_generic() {
            diagnostics.push(format!(
                "generic type '{}' in {} is not supported",
                decl.name(),
                decl.file().display()
            ));
        }
    }
}

/// Resolve `.` and `..` without touching the file system
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
