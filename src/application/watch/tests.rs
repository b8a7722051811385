//! Tests for the watch module

use super::coordinator::{WatchCoordinator, WatchOptions};
use super::event::{WatchEvent, WatcherState, DEBOUNCE_MS};
use super::watch_set::WatchSet;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

use crate::application::scheduler::RebuildScheduler;
use crate::application::worker::WorkerContext;
use crate::domain::ports::file_system::FileSystem;
use crate::domain::ports::module_parser::ModuleParser;
use crate::domain::ports::path_watcher::PathWatcher;
use crate::error::RegenResult;
use crate::infrastructure::fs::LocalFs;
use crate::infrastructure::parser::TsModuleParser;
use crate::infrastructure::registry::FsRouteRegistry;
use crate::infrastructure::synthesizer::JsonSchemaSynthesizer;
use crate::infrastructure::write_guard::WriteGuard;

#[derive(Default)]
struct FakeWatcher {
    files: Vec<PathBuf>,
    trees: Vec<PathBuf>,
}

impl PathWatcher for FakeWatcher {
    fn add(&mut self, path: &Path) -> RegenResult<()> {
        self.files.push(path.to_path_buf());
        Ok(())
    }

    fn add_recursive(&mut self, dir: &Path) -> RegenResult<()> {
        self.trees.push(dir.to_path_buf());
        Ok(())
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/routes")).unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::write(&path, content).unwrap();
        path
    }

    fn coordinator(&self) -> WatchCoordinator<FakeWatcher> {
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new());
        let parser: Arc<dyn ModuleParser> = Arc::new(TsModuleParser::default());
        let routes_dir = self.path("src/routes");
        let output_dir = self.path(".routegen");
        let registry = Arc::new(FsRouteRegistry::new(
            fs.clone(),
            parser.clone(),
            routes_dir.clone(),
            output_dir.clone(),
        ));
        let context = Arc::new(WorkerContext {
            guard: Arc::new(WriteGuard::new(fs.clone())),
            fs: fs.clone(),
            parser,
            synthesizer: Arc::new(JsonSchemaSynthesizer::new()),
            root: self.dir.path().to_path_buf(),
            max_depth: 8,
        });
        WatchCoordinator::new(
            WatchOptions::new(routes_dir, output_dir),
            registry,
            RebuildScheduler::new(context, 2),
            fs,
            FakeWatcher::default(),
        )
    }
}

const MODELS: &str = "export type Order = { id: string };";
const ORDERS: &str = "import type { Order } from '../models';\nexport const orders = route<void, Order>(h);";
const INLINE_ORDERS: &str = "export const orders = route<void, { id: string }>(h);";

fn route_ids<W: PathWatcher>(coordinator: &WatchCoordinator<W>) -> Vec<String> {
    coordinator.routes().map(|r| r.id().to_string()).collect()
}

// === Coordinator tests ===

#[test]
fn test_bootstrap_generates_and_watches_dependencies() {
    let project = Project::new();
    let models = project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS);
    let mut coordinator = project.coordinator();
    let events = RefCell::new(Vec::new());

    let report = coordinator
        .bootstrap(&|e: WatchEvent| events.borrow_mut().push(e))
        .unwrap();

    assert_eq!(report.rebuilt, vec!["orders"]);
    assert!(project.path(".routegen/orders/schema.gen.ts").exists());
    assert!(coordinator.watch_set().contains(&models));
    assert!(coordinator.watcher().files.contains(&models));
    assert_eq!(coordinator.watcher().trees, vec![project.path("src/routes")]);

    let events = events.into_inner();
    assert!(matches!(&events[0], WatchEvent::WatchStarted { routes: 1, .. }));
    assert!(events.contains(&WatchEvent::DependencyAdded {
        path: models.display().to_string(),
        route: "orders".to_string(),
    }));
}

#[test]
fn test_watch_set_grows_when_a_dependency_is_discovered() {
    let project = Project::new();
    let orders = project.write("src/routes/orders.ts", INLINE_ORDERS);
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();
    assert!(coordinator.watch_set().is_empty());

    let models = project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS);
    let outcome = coordinator.handle_changes(&[orders], &|_| {}).unwrap();

    assert_eq!(outcome.affected, vec!["orders"]);
    assert_eq!(outcome.report.rebuilt, vec!["orders"]);
    assert!(coordinator.watch_set().contains(&models));
    assert!(coordinator.watcher().files.contains(&models));
}

#[test]
fn test_dependency_change_rebuilds_every_dependent() {
    let project = Project::new();
    let models = project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS);
    project.write(
        "src/routes/refunds.ts",
        "import type { Order } from '../models';\nexport const refunds = route<void, Order>(h);",
    );
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();

    project.write("src/models.ts", "export type Order = { id: string; qty: number };");
    let outcome = coordinator.handle_changes(&[models], &|_| {}).unwrap();

    assert_eq!(outcome.affected, vec!["orders", "refunds"]);
    let mut rebuilt = outcome.report.rebuilt.clone();
    rebuilt.sort();
    assert_eq!(rebuilt, vec!["orders", "refunds"]);
    let artifact = fs::read_to_string(project.path(".routegen/refunds/schema.gen.ts")).unwrap();
    assert!(artifact.contains("qty"));
}

#[test]
fn test_unrelated_and_generated_files_are_ignored() {
    let project = Project::new();
    project.write("src/routes/orders.ts", INLINE_ORDERS);
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();
    let events = RefCell::new(Vec::new());

    let readme = project.write("README.md", "# shop");
    let notes = project.write("src/routes/notes.md", "todo");
    let generated = project.path(".routegen/orders/schema.gen.ts");
    let outcome = coordinator
        .handle_changes(&[readme, notes, generated], &|e: WatchEvent| events.borrow_mut().push(e))
        .unwrap();

    assert!(outcome.affected.is_empty());
    assert_eq!(outcome.report, Default::default());
    assert!(events.into_inner().is_empty());
}

#[test]
fn test_removed_route_leaves_table_and_watch_set() {
    let project = Project::new();
    let models = project.write("src/models.ts", MODELS);
    let shop = project.write(
        "src/routes/shop.ts",
        "import type { Order } from '../models';\n\
         export const orders = route<void, Order>(h);\n\
         export const carts = route<void, Order>(h);",
    );
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();
    assert_eq!(
        coordinator.watch_set().dependents(&models).collect::<Vec<_>>(),
        vec!["carts", "orders"]
    );

    project.write("src/routes/shop.ts", ORDERS);
    let events = RefCell::new(Vec::new());
    let outcome = coordinator
        .handle_changes(&[shop], &|e: WatchEvent| events.borrow_mut().push(e))
        .unwrap();

    assert_eq!(outcome.affected, vec!["orders"]);
    assert_eq!(route_ids(&coordinator), vec!["orders"]);
    assert_eq!(
        coordinator.watch_set().dependents(&models).collect::<Vec<_>>(),
        vec!["orders"]
    );
    assert!(events.into_inner().contains(&WatchEvent::RouteRemoved {
        route: "carts".to_string()
    }));
}

#[test]
fn test_sibling_route_in_same_module_is_picked_up() {
    let project = Project::new();
    let shop = project.write("src/routes/shop.ts", INLINE_ORDERS);
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();

    project.write(
        "src/routes/shop.ts",
        &format!("{INLINE_ORDERS}\nexport const carts = route<void, {{ items: string[] }}>(h);"),
    );
    let outcome = coordinator.handle_changes(&[shop], &|_| {}).unwrap();

    assert_eq!(outcome.affected, vec!["carts", "orders"]);
    assert!(outcome.report.rebuilt.contains(&"carts".to_string()));
    assert_eq!(route_ids(&coordinator), vec!["carts", "orders"]);
    assert!(project.path(".routegen/carts/schema.gen.ts").exists());
}

#[test]
fn test_new_module_under_routes_dir_is_scanned() {
    let project = Project::new();
    project.write("src/routes/orders.ts", INLINE_ORDERS);
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();

    let ping = project.write("src/routes/ping.ts", "export const ping = route(h);");
    let outcome = coordinator.handle_changes(&[ping], &|_| {}).unwrap();

    assert_eq!(outcome.affected, vec!["ping"]);
    assert_eq!(route_ids(&coordinator), vec!["orders", "ping"]);
}

#[test]
fn test_unparseable_module_keeps_its_routes() {
    let project = Project::new();
    let orders = project.write("src/routes/orders.ts", INLINE_ORDERS);
    let mut coordinator = project.coordinator();
    coordinator.bootstrap(&|_| {}).unwrap();

    project.write("src/routes/orders.ts", "export const orders = route<void, { id: string }>(h;");
    let events = RefCell::new(Vec::new());
    let outcome = coordinator
        .handle_changes(&[orders], &|e: WatchEvent| events.borrow_mut().push(e))
        .unwrap();

    assert_eq!(route_ids(&coordinator), vec!["orders"]);
    assert_eq!(outcome.affected, vec!["orders"]);
    assert!(!outcome.report.diagnostics.is_empty());
    assert!(events
        .into_inner()
        .iter()
        .any(|e| matches!(e, WatchEvent::Error { .. })));
}

#[test]
fn test_new_session_seeds_watch_set_from_hash_maps() {
    let project = Project::new();
    let models = project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS);
    project.coordinator().bootstrap(&|_| {}).unwrap();

    let mut coordinator = project.coordinator();
    let events = RefCell::new(Vec::new());
    let report = coordinator
        .bootstrap(&|e: WatchEvent| events.borrow_mut().push(e))
        .unwrap();

    assert!(report.rebuilt.is_empty());
    assert_eq!(report.up_to_date, vec!["orders"]);
    assert!(report.written.is_empty());
    assert!(coordinator.watch_set().contains(&models));
    assert!(coordinator.watcher().files.contains(&models));
    assert!(!events
        .into_inner()
        .iter()
        .any(|e| matches!(e, WatchEvent::DependencyAdded { .. })));
}

#[test]
fn test_watch_options_debounce() {
    let options = WatchOptions::new("src/routes", ".routegen");
    assert_eq!(options.debounce, Duration::from_millis(DEBOUNCE_MS));

    let options = options.with_debounce(Duration::from_millis(5));
    assert_eq!(options.debounce, Duration::from_millis(5));
}

// === WatchSet tests ===

#[test]
fn test_watch_set_keys_survive_route_removal() {
    let mut set = WatchSet::new();
    assert!(set.insert("/p/models.ts", "orders"));
    assert!(!set.insert("/p/models.ts", "carts"));

    set.remove_route("orders");
    set.remove_route("carts");

    assert!(set.contains(Path::new("/p/models.ts")));
    assert_eq!(set.dependents(Path::new("/p/models.ts")).count(), 0);
    assert_eq!(set.len(), 1);
}

// === WatchEvent tests ===

#[test]
fn test_watch_event_to_json_dependency_added() {
    let event = WatchEvent::DependencyAdded {
        path: "src/models.ts".to_string(),
        route: "orders".to_string(),
    };
    let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
    assert_eq!(json["event"], "dependency_added");
    assert_eq!(json["command"], "watch");
    assert_eq!(json["path"], "src/models.ts");
    assert_eq!(json["route"], "orders");
}

#[test]
fn test_watch_event_to_json_shutdown() {
    insta::assert_snapshot!(WatchEvent::Shutdown.to_json(), @r#"{"command":"watch","event":"shutdown"}"#);
}

#[test]
fn test_watch_event_to_json_error_escapes() {
    let event = WatchEvent::Error {
        message: "Something \"failed\"".to_string(),
    };
    let json = event.to_json();
    assert!(json.contains("\"event\":\"error\""));
    assert!(json.contains("\\\"failed\\\""));
}

#[test]
fn test_watch_event_to_line() {
    let event = WatchEvent::RebuildComplete {
        rebuilt: 2,
        up_to_date: 1,
        failed: 0,
        written: 4,
    };
    assert_eq!(
        event.to_line(),
        "rebuilt 2, up to date 1, failed 0, 4 files written"
    );
}

// === WatcherState tests ===

#[test]
fn test_watcher_state_debouncing() {
    let mut state = WatcherState::new();

    assert!(!state.should_sync());

    state.add_change(PathBuf::from("orders.ts"));
    assert!(!state.should_sync());
    assert!(state.has_pending());

    std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 10));
    assert!(state.should_sync());

    let changes = state.take_changes();
    assert_eq!(changes, vec![PathBuf::from("orders.ts")]);
    assert!(!state.should_sync());
    assert!(!state.has_pending());
}

#[test]
fn test_watcher_state_coalesces_and_sorts_changes() {
    let mut state = WatcherState::with_debounce(Duration::ZERO);

    state.add_change(PathBuf::from("b.ts"));
    state.add_change(PathBuf::from("a.ts"));
    state.add_change(PathBuf::from("b.ts"));

    assert!(state.should_sync());
    assert_eq!(
        state.take_changes(),
        vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")]
    );
}
