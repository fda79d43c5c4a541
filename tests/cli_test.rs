//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation
//! - Dry run mode
//! - Tagging metric lines from stdin and files

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the collectd-tagger binary
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd =
        Command::cargo_bin("collectd-tagger").expect("Failed to find collectd-tagger binary");
    cmd.env_remove("COLLECTD_TAGGER_CONFIG")
        .env_remove("COLLECTD_TAGGER_PREFIX")
        .env_remove("COLLECTD_TAGGER_STORE_RATES")
        .env_remove("COLLECTD_TAGGER_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a temporary file with given content
fn create_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write content");
    file.flush().expect("Failed to flush");
    file
}

const SAMPLE_INPUT: &str = "\
collectd.web01.cpu-0.cpu-user 12.5 1700000000
collectd.web01.load.load.shortterm 0.42 1700000000
collectd.web01.disk-sda.disk_octets.read 4096 1700000000
collectd.web01.interface-eth0.if_octets.rx 2048 1700000000
collectd.web01.nginx.requests 10 1700000000
";

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--store-rates"))
        .stdout(predicate::str::contains("--prefix"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test that a valid configuration is accepted via --validate flag
#[test]
fn test_validate_valid_config() {
    let config = r#"
collectd:
  collectd_prefix: "^collectd\\."
  collectd_StoreRates: true
output:
  format: json
"#;

    let file = create_temp_file(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("16 rules"));
}

/// Test that invalid YAML is rejected
#[test]
fn test_validate_invalid_yaml() {
    let file = create_temp_file("collectd: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that an unanchored prefix is rejected
#[test]
fn test_validate_unanchored_prefix() {
    let file = create_temp_file("collectd:\n  collectd_prefix: \"collectd\\\\.\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that a prefix given on the command line is validated too
#[test]
fn test_prefix_override_is_validated() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--prefix")
        .arg("^(unclosed")
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that a missing config file falls back to defaults
#[test]
fn test_missing_config_file_uses_defaults() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains(r"prefix ^collectd\."));
}

/// Test that --dry-run prints the rule table
#[test]
fn test_dry_run_lists_rules() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("16 rules"))
        .stdout(predicate::str::contains("conntrack"))
        .stdout(predicate::str::contains("fixup: Disk"));
}

/// Test that --dry-run honours the output format
#[test]
fn test_dry_run_json() {
    let output = cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--dry-run")
        .arg("--output-format")
        .arg("json")
        .output()
        .expect("Failed to run command");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("dry run output is not JSON");
    let rules = parsed["rules"].as_array().expect("rules array");
    assert_eq!(rules.len(), 16);
    assert_eq!(rules[0]["name"], "cpu");
    assert_eq!(rules[0]["type"], "gauge_pct");
}

/// Test tagging lines read from stdin
#[test]
fn test_stdin_text_output() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .write_stdin(SAMPLE_INPUT)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "collectd.web01.load.load.shortterm collectd_plugin=load server=web01 target_type=gauge type=01 unit=load 0.42 1700000000",
        ))
        .stdout(predicate::str::contains("direction=in"))
        .stdout(predicate::str::contains("nginx").not());
}

/// Test that counters become rates when store rates is enabled
#[test]
fn test_store_rates_override() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--store-rates")
        .arg("true")
        .write_stdin(SAMPLE_INPUT)
        .assert()
        .success()
        .stdout(predicate::str::contains("unit=B/s"))
        .stdout(predicate::str::contains("target_type=rate"));
}

/// Test environment variable override for store rates
#[test]
fn test_env_store_rates_override() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .env("COLLECTD_TAGGER_STORE_RATES", "true")
        .write_stdin("collectd.web01.disk-sda.disk_ops.write 3\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unit=Req/s"));
}

/// Test JSON records read from a file argument
#[test]
fn test_file_input_json_output() {
    let input = create_temp_file(SAMPLE_INPUT);

    let output = cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--output-format")
        .arg("json")
        .arg(input.path())
        .output()
        .expect("Failed to run command");

    assert!(output.status.success());
    let records: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .expect("stdout is not UTF-8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("record is not JSON"))
        .collect();

    assert_eq!(records.len(), 4);
    assert_eq!(records[2]["rule"], "disk");
    assert_eq!(records[2]["tags"]["unit"], "B");
    assert!(records[2]["tags"].get("type").is_none());
    assert_eq!(records[2]["target_type"], "counter");
    assert!(records[2]["tags"].get("wt").is_none());
}

/// Test that a custom prefix changes which names match
#[test]
fn test_custom_prefix() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--prefix")
        .arg(r"^servers\.")
        .write_stdin("servers.db01.users.users 4\ncollectd.db01.users.users 4\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("servers.db01.users.users"))
        .stdout(predicate::str::contains("collectd.db01.users.users").not());
}

/// Test that a rejected metric is skipped by default
#[test]
fn test_unknown_subtype_skipped() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .write_stdin("collectd.h.disk-sda.disk_bogus.read 1\ncollectd.h.users.users 2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("collectd.h.users.users"))
        .stdout(predicate::str::contains("disk_bogus").not());
}

/// Test that --fail-fast turns a rejected metric into a failure
#[test]
fn test_fail_fast_unknown_subtype() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("--fail-fast")
        .write_stdin("collectd.h.disk-sda.disk_bogus.read 1\n")
        .assert()
        .failure();
}

/// Test that a missing input file is an error
#[test]
fn test_missing_input_file() {
    cmd()
        .arg("-c")
        .arg("/nonexistent/path/config.yaml")
        .arg("/nonexistent/path/metrics.txt")
        .assert()
        .failure();
}
