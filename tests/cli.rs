//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn list_reports_empty_data_dir() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("inviteflow").unwrap();
    cmd.args(["--data-dir", dir.path().to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No flow records found"));
}

#[test]
fn show_reports_missing_record() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("inviteflow").unwrap();
    cmd.args(["--data-dir", dir.path().to_str().unwrap(), "show", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No record for invite code abc123"));
}

#[test]
fn resume_defaults_to_welcome_for_unknown_code() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("inviteflow").unwrap();
    cmd.args([
        "--data-dir",
        dir.path().to_str().unwrap(),
        "resume",
        "abc123",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("welcome"));
}

#[test]
fn reset_all_reports_removed_count() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("inviteflow").unwrap();
    cmd.args(["--data-dir", dir.path().to_str().unwrap(), "reset-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Erased 0 record(s)"));
}
