//! Tests for layered config loading (file → env → CLI overrides).

use kiln_config::{
    ConfigDiscovery, ConfigError, ConfigOverrides, DevOverrides, Mode, UnhandledPolicy,
};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn clear_env() {
    unsafe {
        env::remove_var("KILN_MODE");
        env::remove_var("KILN_OUTPUT__DIR");
        env::remove_var("KILN_UNHANDLED");
    }
}

#[test]
#[serial]
fn toml_file_overrides_defaults() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("kiln.toml"),
        r#"
mode = "development"

[entries]
main = "src/main.js"

[output]
dir = "public"

[dev]
port = 8080
"#,
    )
    .expect("write config");

    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .expect("load");

    assert_eq!(config.resolved_mode().unwrap(), Mode::Development);
    assert_eq!(config.output.dir, PathBuf::from("public"));
    // Unspecified nested fields keep their defaults
    assert_eq!(config.output.filename, "app/[name].js");
    assert_eq!(config.dev.port, 8080);
    assert_eq!(config.dev.host, "127.0.0.1");
    // A declared entry table replaces the default one
    assert_eq!(config.entries.len(), 1);
    assert_eq!(config.entries["main"].path(), Path::new("src/main.js"));
}

#[test]
#[serial]
fn json_file_is_supported() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("kiln.json"),
        r#"{ "unhandled": "error", "clean": { "keep": ["CNAME"] } }"#,
    )
    .expect("write config");

    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .expect("load");

    assert_eq!(config.unhandled, UnhandledPolicy::Error);
    assert_eq!(config.clean.keep, vec!["CNAME".to_string()]);
    assert!(config.clean.enabled);
}

#[test]
#[serial]
fn package_json_kiln_field_is_loaded() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "site", "kiln": { "output": { "public_path": "/static/" } } }"#,
    )
    .expect("write package.json");

    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .expect("load");

    assert_eq!(config.output.public_path, "/static/");
}

#[test]
#[serial]
fn environment_overrides_file() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("kiln.toml"),
        "mode = \"production\"\n[output]\ndir = \"public\"\n",
    )
    .expect("write config");

    unsafe {
        env::set_var("KILN_MODE", "development");
        env::set_var("KILN_OUTPUT__DIR", "www");
    }
    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .expect("load");
    clear_env();

    assert_eq!(config.resolved_mode().unwrap(), Mode::Development);
    assert_eq!(config.output.dir, PathBuf::from("www"));
}

#[test]
#[serial]
fn cli_overrides_win_over_environment() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");

    unsafe {
        env::set_var("KILN_MODE", "development");
    }
    let overrides = ConfigOverrides {
        mode: Some("production".to_string()),
        unhandled: Some(UnhandledPolicy::Error),
        dev: Some(DevOverrides { port: Some(3000) }),
    };
    let config = ConfigDiscovery::new(dir.path())
        .load(&overrides)
        .expect("load");
    clear_env();

    assert_eq!(config.resolved_mode().unwrap(), Mode::Production);
    assert_eq!(config.unhandled, UnhandledPolicy::Error);
    assert_eq!(config.dev.port, 3000);
}

#[test]
#[serial]
fn unknown_mode_surfaces_as_config_error() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("kiln.toml"), "mode = \"staging\"\n").expect("write config");

    let config = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .expect("load succeeds; mode is parsed late");

    assert!(matches!(
        config.resolved_mode(),
        Err(ConfigError::UnknownMode(ref m)) if m == "staging"
    ));
}

#[test]
#[serial]
fn malformed_file_is_invalid_value() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("kiln.toml"), "[output]\ndir = 42\n").expect("write config");

    let err = ConfigDiscovery::new(dir.path())
        .load(&ConfigOverrides::default())
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
