mod common;

use serde_json::Value;

use common::*;

#[test]
fn test_generate_then_up_to_date() {
    let project = TestProject::new();
    project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS_IMPORTING_MODELS);

    let first = project.run(&["generate", "--json"]);
    assert!(first.success, "stderr:\n{}", first.stderr);
    let report: Value = serde_json::from_str(first.stdout.trim()).unwrap();
    assert_eq!(report["command"], "generate");
    assert_eq!(report["rebuilt"][0], "orders");

    let artifact = project.read(".routegen/orders/schema.gen.ts");
    assert!(artifact.starts_with("// @generated by routegen from src/routes/orders.ts"));
    assert!(artifact.contains("export const ordersSchema = {"));
    let hash_map: Value = serde_json::from_str(&project.read(".routegen/orders/hash-map.json")).unwrap();
    assert_eq!(hash_map["file"], "src/routes/orders.ts");
    assert!(hash_map["deps"]["src/models.ts"].is_string());

    let second = project.run(&["generate", "--json"]);
    assert!(second.success);
    let report: Value = serde_json::from_str(second.stdout.trim()).unwrap();
    assert_eq!(report["up_to_date"][0], "orders");
    assert_eq!(report["written"].as_array().unwrap().len(), 0);
}

#[test]
fn test_status_reports_dependency_change() {
    let project = TestProject::new();
    project.write("src/models.ts", MODELS);
    project.write("src/routes/orders.ts", ORDERS_IMPORTING_MODELS);
    assert!(project.run(&["generate"]).success);

    project.write("src/models.ts", "export type Order = { id: number };\n");
    let status = project.run(&["status", "--json"]);

    assert!(status.success, "stderr:\n{}", status.stderr);
    let value: Value = serde_json::from_str(status.stdout.trim()).unwrap();
    assert_eq!(value["routes"][0]["route"], "orders");
    assert_eq!(value["routes"][0]["stale"], true);
    assert_eq!(value["routes"][0]["reason"], "dependency changed: src/models.ts");
}

#[test]
fn test_routes_lists_roots() {
    let project = TestProject::new();
    project.write(
        "src/routes/orders.ts",
        "export const listOrders = route<{ page: number }, void, Order[]>(h);\n",
    );

    let result = project.run(&["routes"]);

    assert!(result.success, "stderr:\n{}", result.stderr);
    assert!(result.stdout.contains("listOrders (src/routes/orders.ts)"));
    assert!(result.stdout.contains("  params: { page: number }"));
    assert!(result.stdout.contains("  response: Order[]"));
    assert!(!result.stdout.contains("payload"));
}

#[test]
fn test_generate_honours_config_file() {
    let project = TestProject::new();
    project.write("routegen.toml", "[routes]\ndir = \"api\"\nfactory = \"endpoint\"\n\n[output]\ndir = \"gen\"\n");
    project.write("api/ping.ts", "export const ping = endpoint<void, { ok: boolean }>(h);\n");

    let result = project.run(&["generate", "--jobs", "1"]);

    assert!(result.success, "stderr:\n{}", result.stderr);
    assert!(project.path("gen/ping/schema.gen.ts").exists());
    assert!(!project.path(".routegen").exists());
}

#[test]
fn test_generate_fails_when_output_is_unwritable() {
    let project = TestProject::new();
    project.write("src/routes/orders.ts", ORDERS);
    // A plain file where the output directory should be.
    project.write(".routegen", "not a directory");

    let result = project.run(&["generate"]);

    assert!(!result.success);
    assert!(result.stdout.contains("Generation failed"));
    assert!(result.stderr.contains("1 route(s) failed to generate"));
}

#[test]
fn test_missing_routes_dir_is_an_error() {
    let project = TestProject::new();
    std::fs::remove_dir_all(project.path("src/routes")).unwrap();

    let result = project.run(&["generate"]);

    assert!(!result.success);
    assert!(result.stderr.contains("directory not found"));
}
