//! End-to-end tests for the `kiln` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INDEX_HTML: &str = "<!doctype html>\n<html>\n<head>\n<title>site</title>\n</head>\n<body>\n</body>\n</html>\n";

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn stock_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/app/index.js", "console.log('hello');\n");
    write(dir.path(), "src/index.html", INDEX_HTML);
    write(dir.path(), "src/fonts/body.woff2", "font");
    dir
}

fn kiln() -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

#[test]
fn build_writes_the_stock_tree() {
    let project = stock_project();

    kiln()
        .args(["build", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Build completed"));

    let out = project.path().join("dist");
    assert!(out.join("app/app.js").is_file());
    assert!(out.join("app/app.js.map").is_file());
    assert!(out.join("acsses/body.woff2").is_file());
    let html = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(html.contains("<script src=\"/app/app.js\"></script>"));
}

#[test]
fn development_build_inlines_source_maps() {
    let project = stock_project();

    kiln()
        .args(["build", "--mode", "development", "--cwd"])
        .arg(project.path())
        .assert()
        .success();

    let out = project.path().join("dist");
    assert!(!out.join("app/app.js.map").exists());
    let js = fs::read_to_string(out.join("app/app.js")).unwrap();
    assert!(js.contains("sourceMappingURL=data:application/json"));
}

#[test]
fn strict_build_fails_on_unhandled_files_and_keeps_output() {
    let project = stock_project();
    write(project.path(), "src/notes.txt", "todo");
    write(project.path(), "dist/previous.js", "old");

    kiln()
        .args(["build", "--strict", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/notes.txt"));

    assert!(project.path().join("dist/previous.js").exists());
    assert!(!project.path().join("dist/app/app.js").exists());
}

#[test]
fn unhandled_files_warn_by_default() {
    let project = stock_project();
    write(project.path(), "src/notes.txt", "todo");

    kiln()
        .args(["build", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("matched no rule"));
}

#[test]
fn unknown_mode_is_rejected() {
    let project = stock_project();

    kiln()
        .args(["build", "--mode", "staging", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mode 'staging'"));

    assert!(!project.path().join("dist").exists());
}

#[test]
fn failing_file_exits_non_zero_and_names_the_path() {
    let project = stock_project();
    write(
        project.path(),
        "kiln.toml",
        r#"
[transforms.broken]
command = "kiln-test-no-such-program"

[[rules]]
name = "styles"
test = "\\.css$"
use = ["broken", "extract-css"]
"#,
    );
    write(project.path(), "src/styles/main.css", "body { color: red; }\n");

    kiln()
        .args(["build", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("src/styles/main.css"));

    // Every other output is still written
    assert!(project.path().join("dist/app/app.js").is_file());
}

#[test]
fn check_prints_the_routing_table_without_writing() {
    let project = stock_project();

    kiln()
        .args(["check", "--cwd"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("src/app/index.js"))
        .stdout(predicate::str::contains("app/app.js"))
        .stdout(predicate::str::contains("acsses/body.woff2"));

    assert!(!project.path().join("dist").exists());
}

#[test]
fn check_json_output_parses() {
    let project = stock_project();

    let output = kiln()
        .args(["check", "--json", "--cwd"])
        .arg(project.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert!(rows.iter().any(|row| row["source"] == "src/fonts/body.woff2"
        && row["rule"] == "fonts"
        && row["output"] == "acsses/body.woff2"));
}

#[test]
fn serve_refuses_production_mode() {
    let project = stock_project();

    kiln()
        .args(["serve", "--mode", "production", "--cwd"])
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("disabled in production mode"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let project = stock_project();

    kiln()
        .args(["build", "--config"])
        .arg(project.path().join("missing.toml"))
        .arg("--cwd")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}
