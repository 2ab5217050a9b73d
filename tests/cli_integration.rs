use std::fs;
use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const INVENTORY_URL: &str = "http://host/inventory.svc";

fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn odex() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_odex"));
    cmd.env("NO_COLOR", "1")
        .env_remove("ODEX_CONFIG")
        .env_remove("ODEX_ENDPOINT")
        .env_remove("RUST_LOG");
    cmd
}

/// `odex` against the inventory fixture, without a config file.
fn inventory(args: &[&str]) -> Command {
    let mut cmd = odex();
    cmd.args(["--endpoint", INVENTORY_URL, "--metadata", &fixture("inventory.json")])
        .args(args);
    cmd
}

fn run_ok(mut cmd: Command) -> Output {
    let output = cmd.output().expect("odex command executes");
    assert!(
        output.status.success(),
        "odex failed:\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn json_stdout(cmd: Command) -> Value {
    let output = run_ok(cmd);
    serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn json_error(mut cmd: Command) -> Value {
    let output = cmd.output().expect("odex command executes");
    assert!(!output.status.success());
    serde_json::from_slice(&output.stderr).expect("stderr should be a json error")
}

#[test]
fn entities_minimal_lists_hierarchy() {
    inventory(&["--format", "minimal", "entities"])
        .assert()
        .success()
        .stdout("Device\n. . Laptop\n. . Server\nPort\nRegion\nSite\n");
}

#[test]
fn entities_json_carries_query_names() {
    let entities = json_stdout(inventory(&["entities"]));
    let server = entities
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == "Server")
        .unwrap();
    assert_eq!(server["query_name"], "Items/Inventory.Server");
    assert_eq!(server["depth"], 1);
    assert_eq!(server["display_name"], ". . Server");
}

#[test]
fn items_json_describes_navigations() {
    let items = json_stdout(inventory(&["items", "Device", "--navigation"]));
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Ports");
    assert_eq!(items[0]["multiplicity"], "*");
    assert_eq!(items[0]["target"], "Port");
    assert_eq!(items[1]["name"], "Site");
    assert_eq!(items[1]["multiplicity"], "1");
}

#[test]
fn operators_follow_property_type() {
    inventory(&["--format", "minimal", "operators", "Server", "Site/Name"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0\tequals\n1\tnot equals\n2\tin (; separated)\n"));

    let listing = json_stdout(inventory(&["operators", "Laptop", "InstalledOn"]));
    assert_eq!(listing["family"], "date_time");
    assert_eq!(listing["operators"][0]["display_name"], "before");
    assert_eq!(listing["operators"][0]["input"]["kind"], "choice");
    assert_eq!(listing["operators"][0]["input"]["options"][2], "a week ago");
}

#[test]
fn complex_properties_are_not_queryable() {
    let err = json_error(inventory(&["operators", "Site", "Address"]));
    assert_eq!(err["error"], "property_not_queryable");
    assert_eq!(err["message"], "You are not able to query on this property.");
}

#[test]
fn url_from_flags() {
    let out = json_stdout(inventory(&[
        "url",
        "Site",
        "--top",
        "5",
        "--filter",
        "Name|in (; separated)|HQ; Lab",
        "--filter",
        "Region/Name|starts with|E",
        "--order-by",
        "Name desc",
        "--select",
        "ID,Name",
        "--expand",
        "Region",
        "--page",
        "2",
    ]));
    assert_eq!(
        out["url"],
        "http://host/inventory.svc/Sites?$skip=10&$top=5\
         &$filter=(Name eq 'HQ' or Name eq 'Lab') and startswith(Region/Name, 'E') eq true\
         &$orderby=Name desc&$select=ID,Name&$expand=Region"
    );
    assert_eq!(out["entity"], "Sites");
    assert_eq!(out["skip"], 10);
    assert_eq!(
        out["filter"],
        "(Name eq 'HQ' or Name eq 'Lab') and startswith(Region/Name, 'E') eq true"
    );
}

#[test]
fn url_from_plan_file_in_pretty_mode() {
    let dir = tempdir().unwrap();
    let plan = dir.path().join("plan.yaml");
    fs::write(
        &plan,
        "entity: Regions\nfilters:\n  - path: Sites/Name\n    op: ends with\n    value: \"'s\"\n",
    )
    .unwrap();

    inventory(&["--pretty", "url", "--plan", plan.to_str().unwrap()])
        .assert()
        .success()
        .stdout("http://host/inventory.svc/Regions?$filter=Sites/any(x: endswith(x/Name, '''s') eq true)\n");
}

#[test]
fn configured_endpoint_supplies_metadata_and_defaults() {
    let dir = tempdir().unwrap();
    fs::copy(fixture("odata_demo.json"), dir.path().join("demo.json")).unwrap();
    let config = dir.path().join("odex.yaml");
    fs::write(
        &config,
        "endpoints:\n  - name: demo\n    url: https://services.odata.org/V3/OData/OData.svc/\n    metadata: demo.json\ndefault_top: 20\n",
    )
    .unwrap();

    let mut cmd = odex();
    cmd.args(["--config", config.to_str().unwrap(), "--format", "minimal", "url", "FeaturedProduct"]);
    cmd.assert().success().stdout(
        "https://services.odata.org/V3/OData/OData.svc/Products/ODataDemo.FeaturedProduct?$top=20\n",
    );

    let mut cmd = odex();
    cmd.env("ODEX_CONFIG", &config).args(["--format", "minimal", "endpoints"]);
    cmd.assert()
        .success()
        .stdout("demo\thttps://services.odata.org/V3/OData/OData.svc/\n");
}

#[test]
fn missing_endpoint_is_reported() {
    let err = json_error({
        let mut cmd = odex();
        cmd.arg("entities");
        cmd
    });
    assert_eq!(err["error"], "missing_endpoint");
}

#[test]
fn unknown_entity_and_page_errors() {
    let err = json_error(inventory(&["url", "Widgets"]));
    assert_eq!(err["error"], "entity_not_found");

    let err = json_error(inventory(&["url", "Sites", "--page", "1"]));
    assert_eq!(err["error"], "page_size_required");

    inventory(&["--format", "pretty", "url", "Sites", "--filter", "ID|equals|one"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error: invalid filter value 'one'"));
}

#[test]
fn results_from_file_and_stdin() {
    let dir = tempdir().unwrap();
    let payload = dir.path().join("payload.json");
    fs::write(
        &payload,
        r#"{"d":{"results":[{"__metadata":{},"ID":0,"Name":"Food"},{"__metadata":{},"ID":1,"Name":"Beverages"}]}}"#,
    )
    .unwrap();

    let mut cmd = odex();
    cmd.args(["--format", "minimal", "results", payload.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout("ID\tName\n0\tFood\n1\tBeverages\n");

    let mut cmd = odex();
    cmd.args(["results", "-", "--title", "Categories"])
        .write_stdin(r#"{"value":[{"ID":7,"Name":"Snacks"}],"@odata.count":1}"#);
    let out: Value = serde_json::from_slice(&run_ok(cmd).stdout).unwrap();
    assert_eq!(out["table"]["title"], "Categories");
    assert_eq!(out["table"]["rows"][0]["cells"][1], "Snacks");
    assert_eq!(out["total_count"], 1);

    let mut cmd = odex();
    cmd.args(["--pretty", "results"]).write_stdin("{\"results\":[]}");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No results."));
}

#[test]
fn info_reports_version() {
    let info = json_stdout({
        let mut cmd = odex();
        cmd.arg("info");
        cmd
    });
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["endpoints"], 0);
    assert!(info["config"].is_null());
}
