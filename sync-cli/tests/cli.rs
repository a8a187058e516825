//! Smoke tests for the `vaultsync` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn vaultsync() -> Command {
    Command::cargo_bin("vaultsync").unwrap()
}

#[test]
fn help_lists_commands() {
    vaultsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("connect"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn init_creates_config() {
    let dir = tempdir().unwrap();

    vaultsync()
        .arg("--vault")
        .arg(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));

    let config = std::fs::read_to_string(dir.path().join(".vaultsync/config.toml")).unwrap();
    assert!(config.contains("session_timeout_secs = 30"));
    assert!(config.contains("prefer-remote"));
}

#[test]
fn second_init_fails() {
    let dir = tempdir().unwrap();

    vaultsync().arg("--vault").arg(dir.path()).arg("init").assert().success();
    vaultsync()
        .arg("--vault")
        .arg(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn status_counts_pending_files() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.md"), b"a").unwrap();
    std::fs::write(dir.path().join("b.md"), b"b").unwrap();

    vaultsync()
        .arg("--vault")
        .arg(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files: 2"))
        .stdout(predicate::str::contains("Pending changes: 2"));
}

#[cfg(unix)]
#[test]
fn status_reports_unsyncable_names() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.md"), b"a").unwrap();
    std::fs::write(dir.path().join("odd\\name.md"), b"b").unwrap();

    vaultsync()
        .arg("--vault")
        .arg(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Files: 1"))
        .stdout(predicate::str::contains("Unsyncable: 1"))
        .stdout(predicate::str::contains("odd\\name.md"));
}

#[test]
fn invalid_code_is_rejected() {
    let dir = tempdir().unwrap();

    vaultsync()
        .arg("--vault")
        .arg(dir.path())
        .args(["connect", "300"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pairing code"));
}
