//! Declarations, type-only imports and route calls read off the syntax tree

use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;

use tree_sitter::Node;

use super::syntax::{self, children, declaration_of, has_token, named_children, text, unquote};
use crate::domain::entities::{DeclarationKind, TypeDeclaration};
use crate::domain::ports::module_parser::{ImportedName, ParsedModule, RouteDeclaration, TypeImport};

/// Walk the top-level statements of a module
pub(crate) fn module(source: &str, file: &Path, root: Node<'_>, factory: &str) -> ParsedModule {
    let mut module = ParsedModule::default();

    for statement in named_children(root) {
        if statement.kind() == "import_statement" {
            module.imports.extend(type_import(source, statement));
            continue;
        }
        let Some(node) = declaration_of(statement) else {
            continue;
        };
        match node.kind() {
            "type_alias_declaration" | "interface_declaration" => {
                module.declarations.extend(declaration(source, file, node));
            }
            "lexical_declaration" if statement.kind() == "export_statement" => {
                let line = statement.start_position().row + 1;
                module.routes.extend(routes(source, node, factory, line));
            }
            _ => {}
        }
    }

    module
}

fn type_import(source: &str, node: Node<'_>) -> Option<TypeImport> {
    let type_only = has_token(node, "type");
    let specifier = unquote(text(source, node.child_by_field_name("source")?));
    let clause = named_children(node)
        .into_iter()
        .find(|c| c.kind() == "import_clause")?;
    let named = named_children(clause)
        .into_iter()
        .find(|c| c.kind() == "named_imports")?;

    let names: Vec<ImportedName> = named_children(named)
        .into_iter()
        .filter(|spec| spec.kind() == "import_specifier")
        .filter(|spec| type_only || has_token(*spec, "type"))
        .filter_map(|spec| {
            let imported = unquote(text(source, spec.child_by_field_name("name")?));
            let local = spec
                .child_by_field_name("alias")
                .map(|alias| text(source, alias).to_string())
                .unwrap_or_else(|| imported.clone());
            Some(ImportedName { imported, local })
        })
        .collect();

    (!names.is_empty()).then_some(TypeImport { specifier, names })
}

fn declaration(source: &str, file: &Path, node: Node<'_>) -> Option<TypeDeclaration> {
    let name_node = node.child_by_field_name("name")?;
    let name = text(source, name_node);
    let offset = node.start_byte();

    let (kind, bodies) = if node.kind() == "interface_declaration" {
        let mut bodies: Vec<Node<'_>> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "extends_type_clause")
            .collect();
        bodies.extend(node.child_by_field_name("body"));
        (DeclarationKind::Interface, bodies)
    } else {
        let bodies: Vec<Node<'_>> = node.child_by_field_name("value").into_iter().collect();
        (DeclarationKind::TypeAlias, bodies)
    };

    let mut bound = BTreeSet::new();
    let type_params = node.child_by_field_name("type_parameters");
    for scope in type_params.iter().chain(&bodies) {
        bind(source, *scope, &mut bound);
    }
    let mut found = Vec::new();
    for body in &bodies {
        collect(source, *body, &bound, &mut found);
    }

    let references = found.iter().map(|(name, _)| name.clone()).collect();
    let spans = found
        .into_iter()
        .map(|(_, span)| span.start - offset..span.end - offset)
        .collect();
    let declaration = TypeDeclaration::new(file, name, kind, text(source, node).trim_end(), references)
        .with_spans(
            name_node.start_byte() - offset..name_node.end_byte() - offset,
            spans,
        );

    Some(match type_params {
        Some(params) => declaration.with_type_params(text(source, params)),
        None => declaration,
    })
}

/// `export const name = <factory><Args...>(...)` declarators
fn routes(source: &str, node: Node<'_>, factory: &str, line: usize) -> Vec<RouteDeclaration> {
    if !has_token(node, "const") {
        return Vec::new();
    }
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "variable_declarator")
        .filter_map(|declarator| {
            let name = declarator.child_by_field_name("name")?;
            let call = declarator
                .child_by_field_name("value")
                .filter(|v| v.kind() == "call_expression")?;
            let function = call.child_by_field_name("function")?;
            if function.kind() != "identifier" || text(source, function) != factory {
                return None;
            }
            let type_args = call
                .child_by_field_name("type_arguments")
                .map(|args| {
                    named_children(args)
                        .into_iter()
                        .map(|arg| text(source, arg).to_string())
                        .collect()
                })
                .unwrap_or_default();
            Some(RouteDeclaration {
                name: text(source, name).to_string(),
                type_args,
                line,
            })
        })
        .collect()
}

/// Names of a standalone type expression
pub(crate) fn type_references(type_text: &str) -> BTreeSet<String> {
    let wrapped = format!("type __Root = {type_text};");
    let Ok(tree) = syntax::parse(&wrapped, syntax::Dialect::TypeScript) else {
        return BTreeSet::new();
    };
    let Some(value) = named_children(tree.root_node())
        .into_iter()
        .find_map(|s| declaration_of(s).and_then(|d| d.child_by_field_name("value")))
    else {
        return BTreeSet::new();
    };

    let mut bound = BTreeSet::new();
    bind(&wrapped, value, &mut bound);
    let mut found = Vec::new();
    collect(&wrapped, value, &bound, &mut found);
    found.into_iter().map(|(name, _)| name).collect()
}

/// Type parameters, `infer` names and mapped-type keys introduced under `node`
fn bind(source: &str, node: Node<'_>, bound: &mut BTreeSet<String>) {
    let introduced = match node.kind() {
        "type_parameter" | "mapped_type_clause" => node.child_by_field_name("name"),
        "infer_type" => named_children(node)
            .into_iter()
            .find(|c| c.kind() == "type_identifier"),
        _ => None,
    };
    if let Some(name) = introduced {
        bound.insert(text(source, name).to_string());
    }
    for child in named_children(node) {
        bind(source, child, bound);
    }
}

/// Every `type_identifier` that names another declaration, with its byte range
fn collect(
    source: &str,
    node: Node<'_>,
    bound: &BTreeSet<String>,
    found: &mut Vec<(String, Range<usize>)>,
) {
    match node.kind() {
        "type_identifier" => {
            let name = text(source, node);
            if !bound.contains(name) {
                found.push((name.to_string(), node.byte_range()));
            }
            return;
        }
        // `NS.Inner` depends on the namespace binding only
        "nested_type_identifier" => {
            if let Some(head) = leftmost_identifier(node) {
                found.push((text(source, head).to_string(), head.byte_range()));
            }
            return;
        }
        "type_query" => return,
        _ => {}
    }
    for child in named_children(node) {
        collect(source, child, bound, found);
    }
}

fn leftmost_identifier(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("module")?;
    while current.kind() != "identifier" {
        current = children(current).into_iter().find(|c| c.is_named())?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::module_parser::ModuleParser;
    use crate::infrastructure::parser::TsModuleParser;

    fn scan(src: &str) -> ParsedModule {
        TsModuleParser::default()
            .parse(Path::new("/p/m.ts"), src)
            .unwrap()
    }

    fn refs(src: &str) -> Vec<String> {
        type_references(src).into_iter().collect()
    }

    #[test]
    fn alias_without_semicolon_ends_at_its_value() {
        let module = scan("type A = { b: B }\nexport type B = string;\nconst x = 1;");
        let names: Vec<_> = module.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(module.declarations[0].text(), "type A = { b: B }");
        assert_eq!(module.declarations[1].text(), "type B = string;");
        assert!(module.declarations[0].references_name("B"));
    }

    #[test]
    fn alias_without_semicolon_before_a_call() {
        let module = scan("type A = { id: string }\nregister(A);\nexport type B = A;");
        assert_eq!(module.declarations[0].text(), "type A = { id: string }");
        assert!(module.declarations[0].references().is_empty());
        assert_eq!(module.declarations[1].text(), "type B = A;");
    }

    #[test]
    fn multi_line_union_stays_one_declaration() {
        let module = scan("export type Status =\n  | 'open'\n  | Closed\n\nexport interface Closed { at: string }");
        assert_eq!(module.declarations.len(), 2);
        assert!(module.declarations[0].references_name("Closed"));
        assert_eq!(module.declarations[1].kind(), DeclarationKind::Interface);
    }

    #[test]
    fn interface_with_extends_and_generics() {
        let module = scan("interface Page<T> extends Base { items: T[]; next?: Cursor }");
        let decl = &module.declarations[0];
        assert!(decl.is_generic());
        assert_eq!(decl.type_params(), Some("<T>"));
        assert!(decl.references_name("Base"));
        assert!(decl.references_name("Cursor"));
        assert!(!decl.references_name("T"));
        assert!(!decl.references_name("items"));
    }

    #[test]
    fn declarations_inside_functions_are_ignored() {
        let module = scan("function f() { type Local = string; }\ntype Top = number;");
        let names: Vec<_> = module.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Top"]);
    }

    #[test]
    fn declared_and_exported_forms() {
        let module = scan("declare type D = string;\nexport declare interface E { d: D }");
        let names: Vec<_> = module.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["D", "E"]);
        assert_eq!(module.declarations[1].text(), "interface E { d: D }");
    }

    #[test]
    fn type_only_imports() {
        let module = scan(
            "import type { User, Address as Addr } from './models';\n\
             import { type Order, helper } from \"../orders\";\n\
             import { value } from './values';",
        );
        assert_eq!(module.imports.len(), 2);
        assert_eq!(module.imports[0].specifier, "./models");
        assert_eq!(module.imports[0].names[1].imported, "Address");
        assert_eq!(module.imports[0].names[1].local, "Addr");
        assert_eq!(module.imports[1].names.len(), 1);
        assert_eq!(module.imports[1].names[0].local, "Order");
    }

    #[test]
    fn route_factory_generic_arguments() {
        let module = scan(
            "export const orders = route<{ id: string }, Payload<X, Y>, Order[]>(async (req) => {\n\
               return { ok: true };\n\
             });\n\
             export const ping = route(() => 'pong');\n\
             export const helper = makeThing<A>();\n\
             const hidden = route<A>(h);",
        );
        assert_eq!(module.routes.len(), 2);
        let orders = module.route("orders").unwrap();
        assert_eq!(
            orders.type_args,
            vec!["{ id: string }", "Payload<X, Y>", "Order[]"]
        );
        assert_eq!(orders.line, 1);
        assert!(module.route("ping").unwrap().type_args.is_empty());
    }

    #[test]
    fn route_with_annotation_and_arrow_types() {
        let module = scan("export const get: Handler = route<void, (a: A) => B, R>(h);");
        let route = module.route("get").unwrap();
        assert_eq!(route.type_args, vec!["void", "(a: A) => B", "R"]);
    }

    #[test]
    fn reference_spans_point_into_the_text() {
        let module = scan("type Line = { sku: Sku; next?: Line }");
        let decl = &module.declarations[0];
        let renames = [("Sku".to_string(), "Sku_2".to_string())].into();
        assert_eq!(
            decl.emitted_as("Line_2", &renames),
            "export type Line_2 = { sku: Sku_2; next?: Line };"
        );
    }

    #[test]
    fn references_skip_keys_and_keywords() {
        assert_eq!(
            refs("{ id: string; owner?: User; tags: Tag[]; [key: string]: Extra }"),
            vec!["Extra", "Tag", "User"]
        );
    }

    #[test]
    fn references_follow_conditional_branches() {
        assert_eq!(refs("A extends B ? C : D"), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn references_skip_infer_and_mapped_keys() {
        assert_eq!(
            refs("T extends Array<infer U> ? U : { [K in Keys]: V }"),
            vec!["Array", "Keys", "T", "V"]
        );
    }

    #[test]
    fn references_skip_member_access_and_typeof() {
        assert_eq!(refs("NS.Inner | typeof value"), vec!["NS"]);
    }
}
