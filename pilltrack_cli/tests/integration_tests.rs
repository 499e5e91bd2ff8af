//! Integration tests for the pilltrack binary.
//!
//! These tests verify end-to-end behavior including:
//! - Login and per-user pill CRUD
//! - Due-reminder dispatch on a check tick
//! - Expired-course deletion
//! - Reminder log rollup

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pilltrack"))
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Medication course tracking and dose reminders",
        ));
}

#[test]
fn test_requires_login_or_user_flag() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no user logged in"));
}

#[test]
fn test_login_persists_current_user() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("login")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as alice"));

    // Subsequent commands pick up the session user
    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No pills tracked for alice"));
}

#[test]
fn test_add_and_list_pill() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Ibuprofen")
        .arg("--hours")
        .arg("8")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Added pill"));

    cli()
        .arg("list")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Ibuprofen"))
        .stdout(predicate::str::contains("next dose"));
}

#[test]
fn test_add_rejects_zero_interval() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Broken")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one minute"));
}

#[test]
fn test_pills_scoped_per_user() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Aspirin")
        .arg("--hours")
        .arg("6")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("list")
        .arg("--user")
        .arg("bob")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No pills tracked for bob"));
}

#[test]
fn test_check_dispatches_due_reminder() {
    let temp_dir = setup_test_dir();

    // One-minute interval: every tick lands inside the 0h 0m window
    cli()
        .arg("add")
        .arg("--name")
        .arg("Vitamin C")
        .arg("--minutes")
        .arg("1")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("check")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Time to take your pill"))
        .stdout(predicate::str::contains("Vitamin C"));

    // Dispatch was logged
    let log_path = temp_dir.path().join("reminders/reminders.log");
    let log = fs::read_to_string(&log_path).expect("Failed to read reminder log");
    assert!(log.contains("Vitamin C"));
    assert!(log.contains("repeat_seconds"));
}

#[test]
fn test_notifications_off_suppresses_dispatch() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Vitamin D")
        .arg("--minutes")
        .arg("1")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("notifications")
        .arg("off")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("check")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Time to take your pill").not());

    assert!(!temp_dir.path().join("reminders/reminders.log").exists());
}

#[test]
fn test_check_deletes_expired_course() {
    let temp_dir = setup_test_dir();

    let start = (Utc::now() - Duration::days(10)).to_rfc3339();
    let end = (Utc::now() - Duration::days(3)).to_rfc3339();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Antibiotic")
        .arg("--hours")
        .arg("8")
        .arg("--start")
        .arg(&start)
        .arg("--end")
        .arg(&end)
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("check")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Course ended: you are done with Antibiotic",
        ));

    // Deleted from the store, gone from subsequent lists
    cli()
        .arg("list")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Antibiotic").not());
}

#[test]
fn test_edit_and_remove() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Old Name")
        .arg("--hours")
        .arg("4")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    // Grab the assigned id from the store document
    let doc = fs::read_to_string(temp_dir.path().join("pills/alice.json")).unwrap();
    let pills: serde_json::Value = serde_json::from_str(&doc).unwrap();
    let id = pills[0]["id"].as_str().unwrap().to_string();

    cli()
        .arg("edit")
        .arg(&id)
        .arg("--name")
        .arg("New Name")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated pill"));

    cli()
        .arg("list")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("New Name"));

    cli()
        .arg("remove")
        .arg(&id)
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("list")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("New Name").not());
}

#[test]
fn test_watch_once_runs_single_tick() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Magnesium")
        .arg("--minutes")
        .arg("1")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("watch")
        .arg("--once")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Magnesium"));
}

#[test]
fn test_rollup_archives_reminder_log() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("add")
        .arg("--name")
        .arg("Zinc")
        .arg("--minutes")
        .arg("1")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("check")
        .arg("--user")
        .arg("alice")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--cleanup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 reminders"));

    let csv_path = temp_dir.path().join("reminders.csv");
    let csv = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert!(csv.contains("Zinc"));

    // Log archived and cleaned up
    assert!(!temp_dir.path().join("reminders/reminders.log").exists());
    assert!(!temp_dir
        .path()
        .join("reminders/reminders.log.processed")
        .exists());
}

#[test]
fn test_rollup_without_log_is_noop() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}
