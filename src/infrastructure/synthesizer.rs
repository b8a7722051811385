//! JSON Schema synthesizer
//!
//! Default `SchemaSynthesizer`: turns the normalized declarations of a type
//! closure into one JSON Schema document whose `definitions` hold one entry
//! per declaration. Only the structural subset of the type language is
//! supported; anything else is reported as an error and no schema is produced.

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};
use tree_sitter::Node;

use crate::domain::ports::schema_synthesizer::{SchemaSynthesizer, Synthesis};
use crate::infrastructure::parser::syntax::{
    self, declaration_of, excerpt, has_token, named_children, text, unquote, Dialect,
};

const DRAFT: &str = "http://json-schema.org/draft-07/schema#";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaSynthesizer;

impl JsonSchemaSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaSynthesizer for JsonSchemaSynthesizer {
    fn synthesize(&self, source: &str) -> Synthesis {
        let tree = match syntax::parse(source, Dialect::TypeScript) {
            Ok(tree) => tree,
            Err(e) => return Synthesis::failed(vec![format!("line {}: {}", e.line, e.message)]),
        };

        let mut definitions = Map::new();
        let mut refs = BTreeSet::new();
        let mut errors = Vec::new();

        for statement in named_children(tree.root_node()) {
            let Some(node) = declaration_of(statement)
                .filter(|d| matches!(d.kind(), "type_alias_declaration" | "interface_declaration"))
            else {
                errors.push(format!(
                    "expected a type declaration, found '{}'",
                    excerpt(source, statement)
                ));
                continue;
            };
            let mut converter = Converter {
                src: source,
                refs: &mut refs,
            };
            match converter.declaration(node) {
                Ok((name, schema)) => {
                    definitions.insert(name, schema);
                }
                Err(message) => errors.push(message),
            }
        }

        for name in &refs {
            if !definitions.contains_key(name) && !errors.iter().any(|e| e.starts_with(&format!("{name}:"))) {
                errors.push(format!("unresolved type reference '{name}'"));
            }
        }

        if !errors.is_empty() {
            return Synthesis::failed(errors);
        }

        let document = json!({
            "$schema": DRAFT,
            "definitions": Value::Object(definitions),
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => Synthesis::success(text),
            Err(e) => Synthesis::failed(vec![e.to_string()]),
        }
    }
}

type Converted<T> = Result<T, String>;

/// Schema conversion over one declaration's syntax tree
struct Converter<'s, 'r> {
    src: &'s str,
    /// Names referenced by `$ref`, checked once every declaration is known
    refs: &'r mut BTreeSet<String>,
}

impl<'s> Converter<'s, '_> {
    fn text(&self, node: Node<'_>) -> &'s str {
        text(self.src, node)
    }

    fn declaration(&mut self, node: Node<'_>) -> Converted<(String, Value)> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let schema = if node.child_by_field_name("type_parameters").is_some() {
            Err("generic declarations are not supported".to_string())
        } else if node.kind() == "interface_declaration" {
            self.interface(node)
        } else {
            match node.child_by_field_name("value") {
                Some(value) => self.type_expr(value),
                None => Err("expected a type".to_string()),
            }
        };

        schema
            .map(|schema| (name.clone(), schema))
            .map_err(|message| format!("{name}: {message}"))
    }

    fn interface(&mut self, node: Node<'_>) -> Converted<Value> {
        let mut bases = Vec::new();
        for clause in named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "extends_type_clause")
        {
            for base in named_children(clause) {
                match base.kind() {
                    "type_identifier" => {
                        let name = self.text(base).to_string();
                        bases.push(reference(&name));
                        self.refs.insert(name);
                    }
                    "generic_type" => {
                        let name = base
                            .child_by_field_name("name")
                            .map(|n| self.text(n))
                            .unwrap_or_default();
                        return Err(format!("generic base '{name}' is not supported"));
                    }
                    _ => {
                        return Err(format!(
                            "unsupported base type '{}'",
                            excerpt(self.src, base)
                        ))
                    }
                }
            }
        }

        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| "expected an interface body".to_string())?;
        let body = self.object(body)?;
        if bases.is_empty() {
            Ok(body)
        } else {
            bases.push(body);
            Ok(json!({ "allOf": bases }))
        }
    }

    fn type_expr(&mut self, node: Node<'_>) -> Converted<Value> {
        match node.kind() {
            "predefined_type" | "type_identifier" => self.named(node),
            "literal_type" => self.literal(node),
            "object_type" => self.object(node),
            "array_type" => {
                let element = first_named(node)?;
                Ok(json!({ "type": "array", "items": self.type_expr(element)? }))
            }
            "tuple_type" => self.tuple(node),
            "union_type" => self.union(node),
            "intersection_type" => {
                let members = flatten(node, "intersection_type")
                    .into_iter()
                    .map(|member| self.type_expr(member))
                    .collect::<Converted<Vec<_>>>()?;
                Ok(json!({ "allOf": members }))
            }
            "parenthesized_type" => self.type_expr(first_named(node)?),
            "generic_type" => self.generic(node),
            "nested_type_identifier" => Err(format!(
                "qualified name '{}' is not supported",
                self.text(node)
            )),
            "function_type" | "constructor_type" => Err("function types are not supported".to_string()),
            "conditional_type" => Err("conditional types are not supported".to_string()),
            "lookup_type" => Err("indexed access types are not supported".to_string()),
            "template_literal_type" => Err("template literal types are not supported".to_string()),
            "index_type_query" => Err("'keyof' types are not supported".to_string()),
            "type_query" => Err("'typeof' types are not supported".to_string()),
            "infer_type" => Err("'infer' types are not supported".to_string()),
            "readonly_type" => Err("'readonly' types are not supported".to_string()),
            _ => Err(format!("unsupported type '{}'", excerpt(self.src, node))),
        }
    }

    /// Keywords, well-known names and references
    fn named(&mut self, node: Node<'_>) -> Converted<Value> {
        let name = self.text(node).to_string();
        let schema = match name.as_str() {
            "string" => json!({ "type": "string" }),
            "number" => json!({ "type": "number" }),
            "boolean" => json!({ "type": "boolean" }),
            "null" => json!({ "type": "null" }),
            "object" => json!({ "type": "object" }),
            "any" | "unknown" => json!({}),
            "never" => json!({ "not": {} }),
            "Date" => json!({ "type": "string", "format": "date-time" }),
            "bigint" | "symbol" | "undefined" | "void" => {
                return Err(format!("'{name}' has no JSON representation"));
            }
            _ if node.kind() == "predefined_type" => {
                return Err(format!("'{name}' types are not supported"));
            }
            _ => {
                let schema = reference(&name);
                self.refs.insert(name);
                schema
            }
        };
        Ok(schema)
    }

    fn literal(&mut self, node: Node<'_>) -> Converted<Value> {
        let value = first_named(node)?;
        match value.kind() {
            "string" => Ok(json!({ "const": unquote(self.text(value)) })),
            "number" => Ok(json!({ "const": number(self.text(value))? })),
            "unary_expression" => {
                let raw = self.text(value);
                match raw.strip_prefix('-') {
                    Some(digits) => Ok(json!({ "const": -number(digits.trim())? })),
                    None => Ok(json!({ "const": number(raw.trim_start_matches('+').trim())? })),
                }
            }
            "true" => Ok(json!({ "const": true })),
            "false" => Ok(json!({ "const": false })),
            "null" => Ok(json!({ "type": "null" })),
            "undefined" => Err("'undefined' has no JSON representation".to_string()),
            _ => Err(format!("unsupported literal '{}'", excerpt(self.src, value))),
        }
    }

    /// `undefined` and `void` members make a property optional in practice and
    /// are dropped.
    fn union(&mut self, node: Node<'_>) -> Converted<Value> {
        let mut members = Vec::new();
        let mut saw_undefined = false;
        for member in flatten(node, "union_type") {
            if matches!(self.text(member), "undefined" | "void") {
                saw_undefined = true;
                continue;
            }
            members.push(self.type_expr(member)?);
        }
        match members.len() {
            0 if saw_undefined => Err("'undefined' has no JSON representation".to_string()),
            1 => Ok(members.remove(0)),
            _ => Ok(json!({ "anyOf": members })),
        }
    }

    fn generic(&mut self, node: Node<'_>) -> Converted<Value> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let args = node
            .child_by_field_name("type_arguments")
            .map(named_children)
            .unwrap_or_default();

        match (name.as_str(), args.as_slice()) {
            ("Array" | "ReadonlyArray", [items]) => {
                Ok(json!({ "type": "array", "items": self.type_expr(*items)? }))
            }
            ("Record", [key, values]) => {
                if self.text(*key) != "string" {
                    return Err(format!(
                        "Record keys other than string are not supported ('{}')",
                        self.text(*key)
                    ));
                }
                Ok(json!({ "type": "object", "additionalProperties": self.type_expr(*values)? }))
            }
            _ => Err(format!("generic type '{name}<...>' is not supported")),
        }
    }

    /// Members of an object type or interface body
    fn object(&mut self, node: Node<'_>) -> Converted<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut additional = Value::Bool(false);

        for member in named_children(node) {
            match member.kind() {
                "property_signature" => {
                    let key_node = member
                        .child_by_field_name("name")
                        .ok_or_else(|| "expected a property name".to_string())?;
                    let key = match key_node.kind() {
                        "string" => unquote(self.text(key_node)),
                        "property_identifier" | "number" => self.text(key_node).to_string(),
                        _ => {
                            return Err(format!(
                                "computed property '{}' is not supported",
                                self.text(key_node)
                            ))
                        }
                    };
                    let annotation = member
                        .child_by_field_name("type")
                        .ok_or_else(|| format!("property '{key}' has no type"))?;
                    let schema = self.type_expr(first_named(annotation)?)?;
                    if !has_token(member, "?") {
                        required.push(Value::String(key.clone()));
                    }
                    properties.insert(key, schema);
                }
                "index_signature" => {
                    if named_children(member)
                        .iter()
                        .any(|c| c.kind() == "mapped_type_clause")
                    {
                        return Err("mapped types are not supported".to_string());
                    }
                    let index = member
                        .child_by_field_name("index_type")
                        .or_else(|| {
                            named_children(member)
                                .into_iter()
                                .find(|c| c.kind() == "predefined_type")
                        })
                        .map(|n| self.text(n));
                    if index != Some("string") {
                        return Err("only string index signatures are supported".to_string());
                    }
                    let annotation = member
                        .child_by_field_name("type")
                        .ok_or_else(|| "index signature has no type".to_string())?;
                    additional = self.type_expr(first_named(annotation)?)?;
                }
                "method_signature" => {
                    let name = member
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    return Err(format!("method signature '{name}' is not supported"));
                }
                "call_signature" | "construct_signature" => {
                    return Err("call signatures are not supported".to_string());
                }
                _ => {
                    return Err(format!(
                        "unsupported member '{}'",
                        excerpt(self.src, member)
                    ))
                }
            }
        }

        let mut object = Map::new();
        object.insert("type".into(), json!("object"));
        object.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            object.insert("required".into(), Value::Array(required));
        }
        object.insert("additionalProperties".into(), additional);
        Ok(Value::Object(object))
    }

    fn tuple(&mut self, node: Node<'_>) -> Converted<Value> {
        let mut items = Vec::new();
        for element in named_children(node) {
            let element = match element.kind() {
                "rest_type" => return Err("rest elements in tuples are not supported".to_string()),
                "optional_type" | "optional_tuple_parameter" => {
                    return Err("optional tuple elements are not supported".to_string());
                }
                // Named element: `[id: string]`
                "required_parameter" | "tuple_parameter" => {
                    if named_children(element)
                        .iter()
                        .any(|c| c.kind() == "rest_pattern")
                    {
                        return Err("rest elements in tuples are not supported".to_string());
                    }
                    let annotation = element
                        .child_by_field_name("type")
                        .ok_or_else(|| "tuple element has no type".to_string())?;
                    first_named(annotation)?
                }
                _ => element,
            };
            items.push(self.type_expr(element)?);
        }
        let len = items.len();
        Ok(json!({
            "type": "array",
            "items": items,
            "minItems": len,
            "maxItems": len,
        }))
    }
}

fn first_named(node: Node<'_>) -> Converted<Node<'_>> {
    named_children(node)
        .into_iter()
        .next()
        .ok_or_else(|| format!("expected a type after '{}'", node.kind()))
}

/// Members of a left-nested union or intersection, in source order
fn flatten<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut members = Vec::new();
    for child in named_children(node) {
        if child.kind() == kind {
            members.extend(flatten(child, kind));
        } else {
            members.push(child);
        }
    }
    members
}

fn reference(name: &str) -> Value {
    json!({ "$ref": format!("#/definitions/{name}") })
}

fn number(text: &str) -> Converted<f64> {
    text.replace('_', "")
        .parse::<f64>()
        .map_err(|_| format!("unsupported numeric literal '{text}'"))
}
