//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary. Tests use
//! `info --json` to assert actual config values, not just process success.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run `info --json` from a directory and parse the JSON output.
fn info_json(dir: &std::path::Path) -> Value {
    info_json_with(cmd(), dir)
}

fn info_json_with(mut command: Command, dir: &std::path::Path) -> Value {
    let output = command
        .args(["-C", dir.to_str().unwrap(), "info", "--json"])
        .output()
        .expect("failed to run command");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());

    assert_eq!(
        json["config"]["log_level"], "info",
        "should use default log level"
    );
    assert!(
        json["config"]["config_file"].is_null(),
        "no config file should be reported"
    );
    assert_eq!(json["config"]["vocabulary_groups"], 6);
    assert_eq!(json["config"]["max_words_per_ingest"], 10_000);
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"log_level = "debug""#).unwrap();

    let json = info_json(tmp.path());

    assert_eq!(json["config"]["log_level"], "debug");
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with(".reader-tools.toml"),
        "should report dotfile: {reported}"
    );
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("chapters").join("one");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"sort = "length""#).unwrap();

    let json = info_json(&sub_dir);

    assert_eq!(json["config"]["sort"], "length");
}

#[test]
fn regular_name_overrides_dotfile() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"sort = "length""#).unwrap();
    fs::write(tmp.path().join("reader-tools.toml"), r#"sort = "frequency""#).unwrap();

    let json = info_json(tmp.path());

    assert_eq!(
        json["config"]["sort"], "frequency",
        "regular file should override dotfile"
    );
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".reader-tools.yaml"),
        "vocabulary_groups: 4\ncorpus_globs:\n  - \"*.txt\"\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["vocabulary_groups"], 4);
    assert_eq!(json["config"]["corpus_globs"], serde_json::json!(["*.txt"]));
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".reader-tools.json"),
        r#"{"log_level": "error", "disable_input_limit": true}"#,
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "error");
    assert!(json["config"]["max_input_bytes"].is_null());
}

// =============================================================================
// Path Resolution
// =============================================================================

#[test]
fn relative_paths_resolve_against_config_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("drafts");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(
        tmp.path().join(".reader-tools.toml"),
        "settings_file = \"conf/settings.json\"\ncorpus_dir = \"texts\"\n",
    )
    .unwrap();

    let json = info_json(&sub_dir);

    let settings = json["config"]["settings_file"].as_str().unwrap();
    let corpus = json["config"]["corpus_dir"].as_str().unwrap();
    assert!(
        !settings.contains("drafts") && settings.ends_with("settings.json"),
        "settings path should sit beside the config: {settings}"
    );
    assert!(corpus.ends_with("texts"), "corpus dir: {corpus}");
}

#[test]
fn settings_file_defaults_to_working_directory() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());
    let settings = json["config"]["settings_file"].as_str().unwrap();
    assert!(settings.ends_with("reader-settings.json"), "{settings}");
    assert!(json["config"]["corpus_dir"].is_null());
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("book");
    fs::create_dir_all(&sub_dir).unwrap();

    fs::write(tmp.path().join(".reader-tools.toml"), r#"log_level = "error""#).unwrap();
    fs::write(sub_dir.join(".reader-tools.toml"), r#"log_level = "debug""#).unwrap();

    let json = info_json(&sub_dir);

    assert_eq!(
        json["config"]["log_level"], "debug",
        "closer config should win"
    );
}

#[test]
fn explicit_config_overrides_discovered() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"sort = "length""#).unwrap();
    let explicit = tmp.path().join("override.toml");
    fs::write(&explicit, r#"sort = "frequency""#).unwrap();

    let output = cmd()
        .args([
            "-C",
            tmp.path().to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
            "info",
            "--json",
        ])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["config"]["sort"], "frequency",
        "--config should override discovered config"
    );
    let reported = json["config"]["config_file"].as_str().unwrap();
    assert!(
        reported.ends_with("override.toml"),
        "--config path should be reported: {reported}"
    );
}

#[test]
fn environment_overrides_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"sort = "length""#).unwrap();

    let mut command = cmd();
    command.env("READER_TOOLS_SORT", "frequency");
    let json = info_json_with(command, tmp.path());

    assert_eq!(json["config"]["sort"], "frequency");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".reader-tools.toml"),
        "this is not valid toml [[[",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration").or(predicate::str::contains("config")));
}

#[test]
fn invalid_sort_value_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".reader-tools.toml"), r#"sort = "random""#).unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".reader-tools.toml"),
        "log_level = \"info\"\nunknown_field = \"should be ignored\"\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "info");
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();

    fs::write(parent.join(".reader-tools.toml"), r#"log_level = "error""#).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let json = info_json(&src);

    assert_eq!(
        json["config"]["log_level"], "info",
        "should use default, boundary stops search"
    );
    assert!(
        json["config"]["config_file"].is_null(),
        "should not find config beyond boundary"
    );
}
