//! Property tests for the type-closure fixed point.

use std::collections::BTreeSet;

use proptest::prelude::*;

use routegen::domain::entities::{DeclarationKind, TypeDeclaration};
use routegen::domain::services::{compute_closure, DeclarationGraph};

fn decl(name: &str, refs: &[String]) -> TypeDeclaration {
    TypeDeclaration::new(
        "/p/src/models.ts",
        name,
        DeclarationKind::TypeAlias,
        format!("type {name} = unknown;"),
        refs.iter().cloned().collect(),
    )
}

/// `T0 -> T1 -> ... -> T(n-1)`, plus an unreferenced `Unused`
fn chain(len: usize) -> Vec<TypeDeclaration> {
    let mut decls: Vec<TypeDeclaration> = (0..len)
        .map(|i| {
            let next: Vec<String> = if i + 1 < len {
                vec![format!("T{}", i + 1)]
            } else {
                Vec::new()
            };
            decl(&format!("T{i}"), &next)
        })
        .collect();
    decls.push(decl("Unused", &["T0".to_string()]));
    decls
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: a chain is included up to `max_depth` hops and no further.
    #[test]
    fn property_chain_is_depth_bounded(len in 1usize..10, max_depth in 0usize..10) {
        let graph = DeclarationGraph::by_name(chain(len));
        let roots: BTreeSet<usize> = graph.find("T0").into_iter().collect();
        let closure = compute_closure(&graph, &roots, max_depth);

        for item in &closure {
            if item.name() == "Unused" {
                prop_assert!(!item.included());
                continue;
            }
            let index: usize = item.name()[1..].parse().unwrap();
            prop_assert_eq!(item.included(), index <= max_depth);
            if item.included() {
                prop_assert_eq!(item.depth(), Some(index));
            }
        }
    }

    /// PROPERTY: every reference of an included declaration that names a
    /// non-generic candidate is included too, given enough depth.
    #[test]
    fn property_closure_is_sound(
        edges in proptest::collection::vec((0usize..6, 0usize..6), 0..12),
        root in 0usize..6,
        generic in proptest::collection::vec(any::<bool>(), 6),
    ) {
        let candidates: Vec<TypeDeclaration> = (0..6)
            .map(|i| {
                let refs: Vec<String> = edges
                    .iter()
                    .filter(|(from, _)| *from == i)
                    .map(|(_, to)| format!("T{to}"))
                    .collect();
                let declaration = decl(&format!("T{i}"), &refs);
                if generic[i] {
                    declaration.with_type_params("<T>")
                } else {
                    declaration
                }
            })
            .collect();
        let graph = DeclarationGraph::by_name(candidates);
        let roots: BTreeSet<usize> = [root].into();

        let closure = compute_closure(&graph, &roots, 6);

        let included: BTreeSet<&str> =
            closure.iter().filter(|d| d.included()).map(|d| d.name()).collect();
        for item in closure.iter().filter(|d| d.included()) {
            prop_assert!(!item.declaration().is_generic());
            for reference in item.declaration().references() {
                let index: usize = reference[1..].parse().unwrap();
                if !generic[index] {
                    prop_assert!(included.contains(reference.as_str()));
                }
            }
        }
        for item in closure.iter().filter(|d| d.declaration().is_generic()) {
            prop_assert!(!item.included());
        }
    }
}
