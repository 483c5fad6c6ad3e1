#![allow(unused)]
//! Headless CLI harness.
//!
//! # What this covers
//!
//! - **Flags over config**: `--events-dir`, `--subscription`, `--duration` and
//!   friends override the config file.
//! - **Output formats**: `--format json` prints the report on stdout, the
//!   default text format prints the summary table.
//! - **Publishing**: the artifact lands in `--output-dir` unless
//!   `--no-publish` is given.
//! - **Bad input**: an invalid start position or a missing config file exits
//!   non-zero.
//!
//! # What this does NOT cover
//!
//! - Ctrl-C handling (signals are not sent from tests)
//!
//! # Running
//!
//! ```sh
//! cargo test --test headless_harness
//! ```

mod common;
use common::*;

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn actlog(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_actlog"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("spawn actlog")
}

/// Events for `sub-1` and `sub-2`, a directory for `sub-1` only, and an empty
/// config file.
fn workspace() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    write_events(&root.path().join("events"), "sub-1", EVENTS_JSONL);
    write_events(&root.path().join("events"), "sub-2", &EVENTS_JSONL[..1]);
    write_directory(&root.path().join("resources"), "sub-1", DIRECTORY_JSON);
    std::fs::write(root.path().join("config.toml"), "").unwrap();
    root
}

fn base_args(root: &Path) -> Vec<String> {
    vec![
        "--config".into(),
        root.join("config.toml").display().to_string(),
        "--events-dir".into(),
        root.join("events").display().to_string(),
        "--directory-dir".into(),
        root.join("resources").display().to_string(),
        "--output-dir".into(),
        root.join("reports").display().to_string(),
        "--duration".into(),
        "5s".into(),
    ]
}

fn run(root: &Path, extra: &[&str]) -> Output {
    let mut args = base_args(root);
    args.extend(extra.iter().map(|s| s.to_string()));
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    actlog(&refs)
}

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

#[test]
fn json_report_on_stdout() {
    let root = workspace();
    let out = run(root.path(), &["--format", "json", "--no-publish"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let doc: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(doc["subscriptions"]["sub-1"]["totals"]["totalEvents"], 4);
    // No directory file for sub-2: the fetch fails, the run does not.
    assert_eq!(doc["subscriptions"]["sub-2"]["status"], "failed");
    assert_eq!(doc["subscriptions"]["sub-2"]["stage"], "fetch_directory");
    assert!(!root.path().join("reports").exists());
}

#[test]
fn text_summary_and_published_artifact() {
    let root = workspace();
    let out = run(root.path(), &["--subscription", "sub-1"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("SUBSCRIPTION"), "{stdout}");
    assert!(stdout.contains("sub-1"));
    assert!(!stdout.contains("sub-2"));

    let published: Vec<_> = std::fs::read_dir(root.path().join("reports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(published.len(), 1);
    assert!(published[0].starts_with("ActivityLog_Report_"));
}

#[test]
fn start_position_and_item_limit_flags() {
    let root = workspace();
    let out = run(
        root.path(),
        &["--subscription", "sub-1", "--start-position", "1", "--max-events", "2", "--format", "json", "--no-publish"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let doc: Value = serde_json::from_slice(&out.stdout).unwrap();
    let collection = &doc["subscriptions"]["sub-1"]["collection"];
    assert_eq!(collection["startPosition"], "1");
    assert_eq!(collection["received"], 2);
    assert_eq!(collection["stopReason"], "event_limit");
}

// ---------------------------------------------------------------------------
// Bad input
// ---------------------------------------------------------------------------

#[test]
fn invalid_start_position_is_rejected() {
    let root = workspace();
    let out = run(root.path(), &["--start-position", "yesterday", "--no-publish"]);
    assert!(!out.status.success());
}

#[test]
fn missing_config_file_is_an_error() {
    let root = workspace();
    let missing = root.path().join("nope.toml").display().to_string();
    let out = actlog(&["--config", &missing, "--no-publish"]);
    assert!(!out.status.success());
}
