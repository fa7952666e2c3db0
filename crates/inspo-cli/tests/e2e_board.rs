//! E2E CLI tests for the project lifecycle:
//! - `insp init`, `insp add` with local media uploads
//! - `insp list` search and sort, `insp show`
//! - `insp edit`, `insp toggle`
//! - `insp delete` confirmation gate
//!
//! Each test runs the `insp` binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the insp binary, rooted in `dir`.
fn insp_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("insp"));
    cmd.current_dir(dir);
    cmd.env("INSPO_PREFS", dir.join("prefs.toml"));
    cmd.env("INSPO_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn init_board(dir: &Path) {
    insp_cmd(dir).args(["init"]).assert().success();
}

fn write_file(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"not really media").expect("write fixture");
}

fn json_of(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Add a project with one PNG attachment and return its JSON.
fn add_item(dir: &Path, title: &str) -> Value {
    write_file(dir, "logo.png");
    let output = insp_cmd(dir)
        .args(["add", "--title", title, "-a", "logo.png", "--json"])
        .output()
        .expect("add should not crash");
    json_of(&output)
}

fn list_json(dir: &Path, extra: &[&str]) -> Vec<Value> {
    let mut args = vec!["list", "--json"];
    args.extend_from_slice(extra);
    let output = insp_cmd(dir).args(&args).output().expect("list should not crash");
    json_of(&output)
        .as_array()
        .expect("list --json should be an array")
        .clone()
}

fn stderr_error_code(output: &std::process::Output) -> String {
    let json: Value =
        serde_json::from_slice(&output.stderr).expect("stderr should carry a JSON error");
    json["error"]["error_code"]
        .as_str()
        .expect("error_code field")
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_board_files() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    assert!(dir.path().join(".inspo/config.toml").exists());
    assert!(dir.path().join(".inspo/items.json").exists());

    insp_cmd(dir.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    insp_cmd(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn commands_outside_a_board_report_not_initialized() {
    let dir = TempDir::new().unwrap();
    let output = insp_cmd(dir.path())
        .args(["list", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "E1001");
}

#[test]
fn add_then_list_and_show() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());

    write_file(dir.path(), "clip.mp4");
    write_file(dir.path(), "logo.png");
    let output = insp_cmd(dir.path())
        .args([
            "add", "--title", "Logo", "-d", "first pass", "-a", "clip.mp4", "-a", "logo.png",
            "--json",
        ])
        .output()
        .unwrap();
    let created = json_of(&output);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["title"], "Logo");
    assert_eq!(created["isDone"], false);
    assert_eq!(created["comments"].as_array().unwrap().len(), 0);
    let kinds: Vec<&str> = created["attachments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["video", "image"]);
    let url = created["attachments"][1]["url"].as_str().unwrap();
    assert!(url.starts_with("file://"));
    assert!(Path::new(url.trim_start_matches("file://")).exists());

    let items = list_json(dir.path(), &[]);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());

    let output = insp_cmd(dir.path())
        .args(["show", id.as_str(), "--json"])
        .output()
        .unwrap();
    let shown = json_of(&output);
    assert_eq!(shown["description"], "first pass");

    insp_cmd(dir.path())
        .args(["show", id.as_str(), "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logo"))
        .stdout(predicate::str::contains("Attachments (2)"));
}

#[test]
fn add_requires_title_and_attachment() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());

    let output = insp_cmd(dir.path())
        .args(["add", "--title", "No media", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "missing_attachments");

    write_file(dir.path(), "logo.png");
    let output = insp_cmd(dir.path())
        .args(["add", "--title", "   ", "-a", "logo.png", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "missing_title");

    assert!(list_json(dir.path(), &[]).is_empty());
}

#[test]
fn unreadable_attachment_is_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    write_file(dir.path(), "logo.png");

    let output = insp_cmd(dir.path())
        .args([
            "add", "--title", "Partial", "-a", "missing.jpg", "-a", "logo.png", "--json",
        ])
        .output()
        .unwrap();
    let created = json_of(&output);
    assert_eq!(created["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(created["upload_failures"][0]["error_code"], "E6001");

    let output = insp_cmd(dir.path())
        .args(["add", "--title", "Nothing", "-a", "missing.jpg", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "missing_attachments");
}

#[test]
fn list_search_and_sort() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    add_item(dir.path(), "motion graphic");
    add_item(dir.path(), "Brand Colors");
    add_item(dir.path(), "album cover");

    let titles = |items: Vec<Value>| -> Vec<String> {
        items
            .iter()
            .map(|i| i["title"].as_str().unwrap().to_string())
            .collect()
    };

    assert_eq!(
        titles(list_json(dir.path(), &[])),
        ["album cover", "Brand Colors", "motion graphic"]
    );
    assert_eq!(
        titles(list_json(dir.path(), &["--sort", "oldest"])),
        ["motion graphic", "Brand Colors", "album cover"]
    );
    assert_eq!(
        titles(list_json(dir.path(), &["--sort", "title-asc"])),
        ["album cover", "Brand Colors", "motion graphic"]
    );
    assert_eq!(
        titles(list_json(dir.path(), &["--search", "COLOR"])),
        ["Brand Colors"]
    );
}

#[test]
fn edit_and_toggle() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = add_item(dir.path(), "Logo")["id"].as_str().unwrap().to_string();

    let output = insp_cmd(dir.path())
        .args(["edit", id.as_str(), "--title", "Logo v2", "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["changed"], true);

    let output = insp_cmd(dir.path())
        .args(["edit", id.as_str(), "--title", "Logo v2", "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["changed"], false);

    let output = insp_cmd(dir.path())
        .args(["toggle", id.as_str(), "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["is_done"], true);

    let items = list_json(dir.path(), &[]);
    assert_eq!(items[0]["title"], "Logo v2");
    assert_eq!(items[0]["isDone"], true);

    let output = insp_cmd(dir.path())
        .args(["toggle", id.as_str(), "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["is_done"], false);
}

#[test]
fn delete_needs_the_exact_title() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let id = add_item(dir.path(), "Launch Plan")["id"]
        .as_str()
        .unwrap()
        .to_string();

    let output = insp_cmd(dir.path())
        .args(["delete", id.as_str(), "--confirm", "launch plan", "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["deleted"], false);
    assert_eq!(list_json(dir.path(), &[]).len(), 1);

    let output = insp_cmd(dir.path())
        .args(["delete", id.as_str(), "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "confirmation_required");

    let output = insp_cmd(dir.path())
        .args(["delete", id.as_str(), "--confirm", "Launch Plan", "--json"])
        .output()
        .unwrap();
    assert_eq!(json_of(&output)["deleted"], true);
    assert!(list_json(dir.path(), &[]).is_empty());
}

#[test]
fn unknown_item_id_is_not_found() {
    let dir = TempDir::new().unwrap();
    init_board(dir.path());
    let output = insp_cmd(dir.path())
        .args(["show", "zzzz", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(stderr_error_code(&output), "E2001");
}
