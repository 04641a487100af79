//! End-to-end tests for the `ks` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ks(store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ks").expect("ks binary should build");
    cmd.arg("--store").arg(store.path());
    cmd
}

#[test]
fn test_set_get_rm_roundtrip() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ks(&store)
        .args(["set", "focusFlow_gardenState_v7", r#"{"xp":50,"stage":2,"cycle":0}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored"));

    ks(&store)
        .args(["get", "focusFlow_gardenState_v7"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""stage":2"#));

    ks(&store)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("focusFlow_gardenState_v7"));

    ks(&store).args(["rm", "focusFlow_gardenState_v7"]).assert().success();

    ks(&store)
        .args(["get", "focusFlow_gardenState_v7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Key not found"));
}

#[test]
fn test_invalid_key_fails() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ks(&store)
        .args(["set", "../outside", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("may not start with '.'"));
}

#[test]
fn test_empty_store_lists_nothing() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ks(&store)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No keys found"));
}

#[test]
fn test_get_pretty_prints_json() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ks(&store)
        .args(["set", "focusFlow_tasks_v7", r#"[{"id":"a1b2c3d4e","completed":false}]"#])
        .assert()
        .success();

    ks(&store)
        .args(["get", "--pretty", "focusFlow_tasks_v7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[\n  {\n"))
        .stdout(predicate::str::contains(r#""id": "a1b2c3d4e""#));

    // Non-JSON values print unchanged
    ks(&store).args(["set", "note", "plain text"]).assert().success();
    ks(&store)
        .args(["get", "-p", "note"])
        .assert()
        .success()
        .stdout("plain text\n");
}

#[test]
fn test_startup_is_logged_at_info() {
    let store = TempDir::new().expect("Failed to create temp dir");

    ks(&store)
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("ks starting, store at"));
}
