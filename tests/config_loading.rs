// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use drivervisor::config::load_and_validate;
use drivervisor::DrivervisorError;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
fn full_config_is_parsed_and_validated() {
    let file = write_config(
        r#"
[driver]
binary = "tauri-driver"
args = ["--port", "4444"]
ready_marker = "Listening on"
startup_timeout = "45s"

[run]
cmd = "npm test"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("config should validate");
    assert_eq!(cfg.driver.binary, "tauri-driver");
    assert_eq!(
        cfg.driver.args,
        vec!["--port".to_string(), "4444".to_string()]
    );
    assert_eq!(cfg.driver.ready_marker, "Listening on");
    assert_eq!(cfg.driver.startup_timeout, Duration::from_secs(45));
    assert_eq!(cfg.run.cmd.as_deref(), Some("npm test"));
}

#[test]
fn startup_timeout_defaults_to_thirty_seconds() {
    let file = write_config(
        r#"
[driver]
binary = "msedgedriver"
ready_marker = "was started successfully"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("minimal config should validate");
    assert_eq!(cfg.driver.startup_timeout, Duration::from_secs(30));
    assert!(cfg.driver.args.is_empty());
    assert!(cfg.run.cmd.is_none());
}

#[test]
fn empty_ready_marker_is_rejected() {
    let file = write_config(
        r#"
[driver]
binary = "tauri-driver"
ready_marker = ""
"#,
    );

    let err = load_and_validate(file.path()).expect_err("empty marker must be rejected");
    assert!(matches!(err, DrivervisorError::ConfigError(_)));
}

#[test]
fn unparseable_timeout_is_rejected() {
    let file = write_config(
        r#"
[driver]
binary = "tauri-driver"
ready_marker = "ready"
startup_timeout = "banana"
"#,
    );

    let err = load_and_validate(file.path()).expect_err("bad duration must be rejected");
    match err {
        DrivervisorError::ConfigError(msg) => {
            assert!(msg.contains("startup_timeout"), "got: {msg}");
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn missing_driver_section_is_a_toml_error() {
    let file = write_config("[run]\ncmd = \"npm test\"\n");

    let err = load_and_validate(file.path()).expect_err("missing [driver] must fail");
    assert!(matches!(err, DrivervisorError::TomlError(_)));
}
