//! Property tests for staleness checks.

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use routegen::domain::entities::{Route, RouteRoots};
use routegen::domain::services::{StalenessChecker, Verdict};
use routegen::infrastructure::MemoryFs;

fn content() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9 ;:{}\n]{0,40}").unwrap()
}

fn route() -> Route {
    Route::new(
        "orders",
        "/p/src/routes/orders.ts",
        Path::new("/p/.routegen"),
        RouteRoots::default(),
    )
}

fn seed(fs: &MemoryFs, source: &str, deps: &[String]) -> Vec<PathBuf> {
    fs.insert("/p/src/routes/orders.ts", source);
    deps.iter()
        .enumerate()
        .map(|(i, text)| {
            let path = PathBuf::from(format!("/p/src/dep{i}.ts"));
            fs.insert(&path, text.as_str());
            path
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: with nothing changed, a route stays up to date on every check.
    #[test]
    fn property_unchanged_route_is_never_stale(
        source in content(),
        deps in proptest::collection::vec(content(), 0..4),
    ) {
        let fs = MemoryFs::new();
        let dep_files = seed(&fs, &source, &deps);
        let root = Path::new("/p");
        let checker = StalenessChecker::new(&fs, root);
        let route = route();

        let stored = checker.compute_hash_map(&route, &dep_files).unwrap();

        for _ in 0..3 {
            prop_assert!(!checker.is_stale(&route, &stored));
        }
    }

    /// PROPERTY: a changed source is stale without reading any dependency.
    #[test]
    fn property_source_change_dominates(
        source in content(),
        edited in content(),
        deps in proptest::collection::vec(content(), 1..4),
    ) {
        prop_assume!(source != edited);
        let fs = MemoryFs::new();
        let dep_files = seed(&fs, &source, &deps);
        let root = Path::new("/p");
        let checker = StalenessChecker::new(&fs, root);
        let route = route();
        let stored = checker.compute_hash_map(&route, &dep_files).unwrap();

        fs.insert("/p/src/routes/orders.ts", edited);
        fs.reset_counters();

        prop_assert_eq!(checker.verdict(&route, &stored), Verdict::SourceChanged);
        for dep in &dep_files {
            prop_assert_eq!(fs.read_count(dep), 0);
        }
    }

    /// PROPERTY: editing any single dependency makes the route stale.
    #[test]
    fn property_dependency_change_is_detected(
        source in content(),
        deps in proptest::collection::vec(content(), 1..4),
        pick in any::<prop::sample::Index>(),
        suffix in "[a-z]{1,8}",
    ) {
        let fs = MemoryFs::new();
        let dep_files = seed(&fs, &source, &deps);
        let root = Path::new("/p");
        let checker = StalenessChecker::new(&fs, root);
        let route = route();
        let stored = checker.compute_hash_map(&route, &dep_files).unwrap();

        let index = pick.index(deps.len());
        fs.insert(&dep_files[index], format!("{}{suffix}", deps[index]));

        prop_assert!(checker.is_stale(&route, &stored));
    }
}
