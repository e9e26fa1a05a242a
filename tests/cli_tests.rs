//! Operator CLI smoke tests.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const ENV_OVERRIDES: &[&str] = &[
    "AMQP_URL",
    "RABBITMQ_USERNAME",
    "RABBITMQ_PASSWORD",
    "DATABASE_URL",
    "ENVIRONMENT",
    "KUBECONFIG",
    "HELM_CHART_NAME",
    "HELM_REPO_NAME",
    "HELM_REPO_URL",
    "HELM_REPO_USERNAME",
    "HELM_REPO_PASSWORD",
    "RUST_LOG",
];

fn proctor(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("proctor").unwrap();
    cmd.current_dir(dir);
    for key in ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let db = dir.join("records.db");
    std::fs::write(
        &path,
        format!(
            "{}\n[store]\npath = {:?}\n",
            proctor::testkit::config::MINIMAL_TOML,
            db.to_string_lossy()
        ),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    proctor(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("attempts"));
}

#[test]
fn check_config_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    proctor(dir.path())
        .args(["check", "config", "--config"])
        .arg(&config)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\":true"))
        .stdout(predicate::str::contains("challenges/challenge"));
}

#[test]
fn check_config_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    proctor(dir.path())
        .args(["check", "config", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}

#[test]
fn registered_image_is_persisted_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let register = |dir: &Path| {
        let mut cmd = proctor(dir);
        cmd.args(["image", "register", "--creator", "alice", "--name", "pwn"])
            .args(["--tag", "v1", "--link", "https://registry.example.com/team/pwn:v1"])
            .arg("--config")
            .arg(&config);
        cmd
    };

    register(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("alice/pwn:v1"));
    register(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate image record"));
}

#[test]
fn attempts_list_reports_empty_challenge() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    proctor(dir.path())
        .args(["attempts", "list", "--creator", "alice", "--challenge", "heap", "--json"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"command\":\"attempts.list\""))
        .stdout(predicate::str::contains("\"attempts\":[]"));
}
