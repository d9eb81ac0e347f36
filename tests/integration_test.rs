// Integration tests for Surveyor

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use surveyor::{
    Component, ComponentKind, Config, DependencyKind, Extractor, FileContext, Ingestion, Location,
    OrganizationKind, PythonParser, ScanReport, Scanner,
};
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// Helper to run a full scan with the default config
fn scan(path: &Path) -> (Ingestion, ScanReport) {
    let scanner = Scanner::new(Config::default()).expect("Failed to create scanner");
    scanner.scan_collect(path).expect("Scan failed")
}

fn component<'a>(ingestion: &'a Ingestion, name: &str) -> &'a Component {
    ingestion
        .components
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("component {} not found", name))
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

// ============================================================================
// Scan Tests
// ============================================================================

#[test]
fn test_scan_fixture_project() {
    let (ingestion, report) = scan(&fixtures_path("shop"));

    assert!(report.errors.is_empty(), "Had unexpected errors: {:?}", report.errors);
    assert_eq!(report.stats.files, 4);
    assert_eq!(report.stats.levels, 3);

    let names: Vec<&str> = ingestion.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Application",
            "Item",
            "Product",
            "ProductRepository",
            "OrderInterface",
            "OrderService",
        ]
    );

    assert_eq!(component(&ingestion, "ProductRepository").kind, ComponentKind::Repository);
    assert_eq!(component(&ingestion, "OrderInterface").kind, ComponentKind::Interface);
    assert_eq!(component(&ingestion, "OrderService").kind, ComponentKind::Class);
    assert_eq!(component(&ingestion, "Application").description, "Wires the services together.");
}

#[test]
fn test_organizations_are_leaf_directories() {
    let (ingestion, _) = scan(&fixtures_path("shop"));

    let orgs: Vec<(&str, OrganizationKind)> = ingestion
        .organizations
        .iter()
        .map(|o| (o.path.as_str(), o.kind))
        .collect();
    assert_eq!(
        orgs,
        vec![
            ("store/models", OrganizationKind::Module),
            ("store/services", OrganizationKind::Module),
            ("store/utils", OrganizationKind::Package),
        ]
    );

    let product_org = component(&ingestion, "Product").organization.as_ref().unwrap();
    assert_eq!(product_org.name, "models");
    assert_eq!(product_org.path, "store/models");
    assert!(component(&ingestion, "Application").organization.is_none());
}

#[test]
fn test_dependencies() {
    let (ingestion, _) = scan(&fixtures_path("shop"));

    let deps: Vec<(&str, &str, DependencyKind)> = ingestion
        .dependencies
        .iter()
        .map(|d| (d.source.as_str(), d.target.as_str(), d.kind))
        .collect();
    assert_eq!(
        deps,
        vec![
            ("Product", "Item", DependencyKind::Extends),
            ("ProductRepository", "Product", DependencyKind::Uses),
            ("OrderService", "OrderInterface", DependencyKind::Extends),
        ]
    );
}

#[test]
fn test_methods_and_parameters() {
    let (ingestion, _) = scan(&fixtures_path("shop"));

    let init = ingestion
        .methods
        .iter()
        .find(|m| m.name == "__init__" && m.location == Location::Component("Product".to_string()))
        .unwrap();
    assert_eq!(init.parameters.len(), 2);
    assert_eq!(init.parameters[0].type_name, "str");
    assert!(init.parameters[0].required);
    assert_eq!(init.parameters[1].default.as_deref(), Some("1.5"));
    assert!(!init.parameters[1].required);

    let blank = ingestion.methods.iter().find(|m| m.name == "blank").unwrap();
    assert!(blank.is_static);
    assert_eq!(blank.return_type, "Any");

    let place = ingestion
        .methods
        .iter()
        .find(|m| m.name == "place" && m.location == Location::Component("OrderService".to_string()))
        .unwrap();
    let params: Vec<&str> = place.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(params, vec!["order", "quantity"]);
    assert_eq!(place.return_type, "placed");

    let money = ingestion.methods.iter().find(|m| m.name == "money").unwrap();
    assert_eq!(money.location, Location::Global);
}

#[test]
fn test_variables_and_flows() {
    let (ingestion, _) = scan(&fixtures_path("shop"));

    let tax = ingestion.variables.iter().find(|v| v.name == "TAX_RATE").unwrap();
    assert!(tax.is_constant);
    assert!(tax.is_static);
    assert_eq!(tax.type_name, "float");
    assert_eq!(tax.component.as_deref(), Some("Product"));

    let currency = ingestion.variables.iter().find(|v| v.name == "CURRENCY").unwrap();
    assert!(currency.is_constant);
    assert_eq!(currency.component, None);

    assert!(ingestion
        .flows
        .iter()
        .any(|f| f.source == "self.cost" && f.target == "total"));
    assert!(ingestion
        .flows
        .iter()
        .any(|f| f.source == "config" && f.target == "self.config"));
}

#[test]
fn test_component_count_matches_top_level_classes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/models.py",
        "class A:\n    class Nested:\n        pass\n\nclass B(A):\n    pass\n\ndef f():\n    class Local:\n        pass\n",
    );
    let (ingestion, report) = scan(dir.path());
    assert!(report.errors.is_empty());
    assert_eq!(ingestion.components.len(), 2);
}

#[test]
fn test_two_leaf_organizations() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pkg/sub/__init__.py", "");
    write(dir.path(), "pkg/other/x.py", "");

    let (ingestion, report) = scan(dir.path());
    assert!(report.errors.is_empty());
    assert_eq!(ingestion.organizations.len(), 2);
    let sub = ingestion.organizations.iter().find(|o| o.name == "sub").unwrap();
    assert_eq!(sub.kind, OrganizationKind::Module);
    let other = ingestion.organizations.iter().find(|o| o.name == "other").unwrap();
    assert_eq!(other.kind, OrganizationKind::Package);
}

#[test]
fn test_scan_is_idempotent() {
    let path = fixtures_path("shop");
    let first = scan(&path);
    let second = scan(&path);
    assert_eq!(first, second);
}

#[test]
fn test_parse_error_does_not_stop_scan() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "good.py", "class Good:\n    pass\n");
    write(dir.path(), "bad.py", "class Bad(:\n    pass\n");
    write(dir.path(), "lib/later.py", "class Later:\n    pass\n");

    let (ingestion, report) = scan(dir.path());
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("bad.py"));
    let names: Vec<&str> = ingestion.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Good", "Later"]);
}

#[test]
fn test_deeply_nested_file_does_not_stop_scan() {
    let dir = TempDir::new().unwrap();
    let expression = format!("x = 1{}\n", " + 1".repeat(20_000));
    write(dir.path(), "big.py", &expression);
    write(dir.path(), "ok.py", "class Ok:\n    pass\n");

    for parallel in [true, false] {
        let mut config = Config::default();
        config.scan.parallel = parallel;
        let scanner = Scanner::new(config).unwrap();
        let (ingestion, report) = scanner.scan_collect(dir.path()).unwrap();

        let names: Vec<&str> = ingestion.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ok"]);
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(report.errors[0].contains("big.py"));
        assert!(report.errors[0].contains("nesting deeper than"));
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_single_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok/a.py", "class A:\n    pass\n");
    let blocked = dir.path().join("locked");
    fs::create_dir_all(&blocked).unwrap();
    fs::set_permissions(&blocked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&blocked).is_ok() {
        // Permissions are not enforced for this user
        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let scanner = Scanner::new(Config::default()).unwrap();
    let result = scanner.scan_collect(dir.path());
    fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();

    let (ingestion, report) = result.unwrap();
    assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    assert!(report.errors[0].contains("locked"));
    assert_eq!(ingestion.components.len(), 1);
}

#[test]
fn test_missing_root_fails() {
    let scanner = Scanner::new(Config::default()).unwrap();
    assert!(scanner.scan_collect(Path::new("/nonexistent/project")).is_err());
}

// ============================================================================
// Extractor Tests
// ============================================================================

#[test]
fn test_extract_single_file() {
    let mut parser = PythonParser::new().unwrap();
    let extractor = Extractor::new(Default::default());
    let file = FileContext::new(fixtures_path("shop/store/models/product.py"));
    let analysis = extractor.analyze_file(&mut parser, &file).unwrap();

    assert_eq!(analysis.components.components.len(), 3);
    assert!(analysis
        .methods
        .methods
        .iter()
        .all(|m| m.location != Location::Unresolved));
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("orgs"));
}

#[test]
fn test_cli_scan_json() {
    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    let output = cmd
        .arg("scan")
        .arg(fixtures_path("shop"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["components"].as_array().unwrap().len(), 6);
    assert_eq!(report["organizations"].as_array().unwrap().len(), 3);
    assert!(report["errors"].as_array().unwrap().is_empty());
    assert_eq!(report["stats"]["files"], 4);
}

#[test]
fn test_cli_scan_jsonl_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out/model.jsonl");

    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("scan")
        .arg(fixtures_path("shop"))
        .args(["--format", "jsonl", "--sequential", "-o"])
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // organizations, three records per file, closing report
    assert_eq!(lines.len(), 1 + 3 * 4 + 1);
    assert_eq!(lines[0]["record"], "organizations");
    assert_eq!(lines[1]["record"], "components");
    assert_eq!(lines[2]["record"], "methods");
    assert_eq!(lines[3]["record"], "variables");
    assert_eq!(lines[lines.len() - 1]["record"], "report");
}

#[test]
fn test_cli_scan_reports_leaf_errors_but_succeeds() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.py", "def broken(:\n");

    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("broken.py"));
}

#[test]
fn test_cli_scan_missing_path() {
    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.args(["scan", "/nonexistent/project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_cli_scan_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("surveyor.toml");
    fs::write(&config, "[scan]\nextensions = []\n").unwrap();

    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("scan")
        .arg(fixtures_path("shop"))
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("extension"));
}

#[test]
fn test_cli_file_with_root() {
    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    let output = cmd
        .arg("file")
        .arg(fixtures_path("shop/store/models/product.py"))
        .arg("--root")
        .arg(fixtures_path("shop"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let analysis: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let components = analysis["components"]["components"].as_array().unwrap();
    assert_eq!(components[0]["name"], "Item");
    assert_eq!(components[0]["organization"]["path"], "store/models");
}

#[test]
fn test_cli_file_parse_error_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bad.py", "class (:\n");

    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("file")
        .arg(dir.path().join("bad.py"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_cli_orgs() {
    let mut cmd = Command::cargo_bin("surveyor").unwrap();
    cmd.arg("orgs")
        .arg(fixtures_path("shop"))
        .assert()
        .success()
        .stdout(predicate::str::contains("store/utils"))
        .stdout(predicate::str::contains("\"package\""));
}
