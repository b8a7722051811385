//! TypeScript module parser
//!
//! Parses handler modules with the tree-sitter TypeScript and TSX grammars and
//! reads top-level declarations, type-only imports and route factory calls
//! off the syntax tree. Nothing is type checked.

mod extract;
pub(crate) mod syntax;

use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::ports::module_parser::{ModuleParser, ParseError, ParsedModule};
use syntax::Dialect;

/// Default name of the route factory function
pub const DEFAULT_FACTORY: &str = "route";

/// `ModuleParser` for `.ts` / `.tsx` handler modules
#[derive(Debug, Clone)]
pub struct TsModuleParser {
    factory: String,
}

impl TsModuleParser {
    pub fn new(factory: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
        }
    }

    pub fn factory(&self) -> &str {
        &self.factory
    }
}

impl Default for TsModuleParser {
    fn default() -> Self {
        Self::new(DEFAULT_FACTORY)
    }
}

impl ModuleParser for TsModuleParser {
    fn parse(&self, file: &Path, text: &str) -> Result<ParsedModule, ParseError> {
        let tree = syntax::parse(text, Dialect::for_path(file))
            .map_err(|e| ParseError::new(file, e.line, e.message))?;
        Ok(extract::module(text, file, tree.root_node(), &self.factory))
    }

    fn references(&self, type_text: &str) -> BTreeSet<String> {
        extract::type_references(type_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = r#"import type { Customer } from "./customers";

export interface CreateOrder {
  customer: Customer;
  lines: OrderLine[];
}

interface OrderLine {
  sku: string;
  quantity: number;
}

type Unused = { n: number };

export const createOrder = route<{ id: string }, CreateOrder, { ok: boolean }>(async (req) => {
  const body = req.body as CreateOrder;
  return { ok: body.lines.length > 0 };
});
"#;

    #[test]
    fn parses_a_handler_module() {
        let module = TsModuleParser::default()
            .parse(Path::new("/app/src/routes/orders.ts"), ORDERS)
            .unwrap();

        let names: Vec<_> = module.declarations.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["CreateOrder", "OrderLine", "Unused"]);
        assert_eq!(module.imports[0].specifier, "./customers");

        let route = module.route("createOrder").unwrap();
        assert_eq!(route.type_args[1], "CreateOrder");
        assert_eq!(route.line, 15);
    }

    #[test]
    fn custom_factory_name() {
        let src = "export const a = route<A>(h);\nexport const b = endpoint<B>(h);";
        let module = TsModuleParser::new("endpoint")
            .parse(Path::new("m.ts"), src)
            .unwrap();
        assert_eq!(module.routes.len(), 1);
        assert_eq!(module.routes[0].name, "b");
    }

    #[test]
    fn unbalanced_module_fails() {
        let err = TsModuleParser::default()
            .parse(Path::new("broken.ts"), "export interface A {\n  a: string;\n")
            .unwrap_err();
        assert!(err.to_string().starts_with("broken.ts:"));
    }

    #[test]
    fn tsx_module_with_jsx() {
        let src = "import type { Props } from './props';\n\
                   export const page = route<Props>(() => <p>Don't panic</p>);\n";
        let module = TsModuleParser::default()
            .parse(Path::new("/app/src/routes/page.tsx"), src)
            .unwrap();

        assert_eq!(module.imports[0].names[0].local, "Props");
        let page = module.route("page").unwrap();
        assert_eq!(page.type_args, vec!["Props"]);
        assert_eq!(page.line, 2);
    }

    #[test]
    fn references_of_a_type_argument() {
        let refs = TsModuleParser::default().references("{ id: OrderId; items: Item[] }");
        assert_eq!(
            refs.into_iter().collect::<Vec<_>>(),
            vec!["Item".to_string(), "OrderId".to_string()]
        );
    }
}
