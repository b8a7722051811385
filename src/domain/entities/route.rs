//! Route entity - one unit of generation work
//!
//! A route is declared once in a handler source module and owns a fixed set
//! of generated files, all derived from its id.

use std::path::{Path, PathBuf};

/// File name of the persisted dependency hash map
pub const HASH_MAP_FILE: &str = "hash-map.json";
/// File name of the type-closure intermediate
pub const TYPES_FILE: &str = "types.d.ts";
/// File name of the final generated artifact
pub const ARTIFACT_FILE: &str = "schema.gen.ts";

/// Generated output locations for one route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    hash_map: PathBuf,
    types: PathBuf,
    artifact: PathBuf,
}

impl ArtifactPaths {
    /// Derive the output paths for `id` under `output_root`.
    ///
    /// The same id always maps to the same locations, so a re-run of
    /// discovery overwrites rather than accumulates files.
    pub fn derive(output_root: &Path, id: &str) -> Self {
        let dir = output_root.join(id);
        Self {
            hash_map: dir.join(HASH_MAP_FILE),
            types: dir.join(TYPES_FILE),
            artifact: dir.join(ARTIFACT_FILE),
            dir,
        }
    }

    /// Directory holding every generated file of the route
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn hash_map(&self) -> &Path {
        &self.hash_map
    }

    pub fn types(&self) -> &Path {
        &self.types
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Whether `path` lives under this route's output directory
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }
}

/// Role of a root type expression in a handler signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RootRole {
    Params,
    Payload,
    Response,
}

impl RootRole {
    pub const ALL: [RootRole; 3] = [RootRole::Params, RootRole::Payload, RootRole::Response];

    /// Suffix used when naming the root alias in generated code
    pub fn suffix(self) -> &'static str {
        match self {
            RootRole::Params => "Params",
            RootRole::Payload => "Payload",
            RootRole::Response => "Response",
        }
    }
}

/// Root type expressions taken from a route's handler signature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRoots {
    params: Option<String>,
    payload: Option<String>,
    response: Option<String>,
}

impl RouteRoots {
    pub fn new(params: Option<String>, payload: Option<String>, response: Option<String>) -> Self {
        Self {
            params,
            payload,
            response,
        }
    }

    /// Build roots from positional generic arguments (`Params, Payload, Response`).
    ///
    /// Blank arguments and the `void`/`never` placeholders count as absent.
    pub fn from_positional(args: &[String]) -> Self {
        let pick = |index: usize| {
            args.get(index)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty() && *s != "void" && *s != "never")
                .map(str::to_string)
        };
        Self::new(pick(0), pick(1), pick(2))
    }

    pub fn get(&self, role: RootRole) -> Option<&str> {
        match role {
            RootRole::Params => self.params.as_deref(),
            RootRole::Payload => self.payload.as_deref(),
            RootRole::Response => self.response.as_deref(),
        }
    }

    /// Present roots in role order
    pub fn iter(&self) -> impl Iterator<Item = (RootRole, &str)> {
        RootRole::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|text| (role, text)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// A route (entity) as supplied by the route registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    id: String,
    source_file: PathBuf,
    artifacts: ArtifactPaths,
    roots: RouteRoots,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        source_file: impl Into<PathBuf>,
        output_root: &Path,
        roots: RouteRoots,
    ) -> Self {
        let id = id.into();
        Self {
            artifacts: ArtifactPaths::derive(output_root, &id),
            id,
            source_file: source_file.into(),
            roots,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of the module declaring this route
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn artifacts(&self) -> &ArtifactPaths {
        &self.artifacts
    }

    pub fn roots(&self) -> &RouteRoots {
        &self.roots
    }

    /// Opaque route parameter text, folded into the source checksum
    pub fn params(&self) -> Option<&str> {
        self.roots.params.as_deref()
    }

    /// Name of the generated alias for a root, e.g. `OrdersPayload`
    pub fn alias_name(&self, role: RootRole) -> String {
        format!("{}{}", pascal_case(&self.id), role.suffix())
    }
}

/// `list_orders` / `list-orders` / `listOrders` -> `ListOrders`
pub(crate) fn pascal_case(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper_next = true;
    for c in id.chars() {
        if c == '_' || c == '-' || c == '.' || c == '$' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
