//! Integration tests for buzz-creds

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const USER: &str = "creator@example.com";

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("buzz.db");

    fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            escape_path_for_toml(&db_path.to_string_lossy())
        ),
    )
    .unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn creds(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("buzz-creds").unwrap();
    cmd.env("BUZZ_CONFIG", config_path)
        .env_remove("BUZZ_DB_PATH")
        .env_remove("BUZZ_USER");
    cmd
}

#[test]
fn test_set_and_list_without_revealing_token() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "twitter", "--stdin"])
        .write_stdin("very-secret-token\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored twitter credential"));

    creds(&config_path)
        .args(["--user", USER, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("twitter: no expiry"))
        .stdout(predicate::str::contains("very-secret-token").not());
}

#[test]
fn test_linkedin_requires_account_id() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "linkedin", "--stdin"])
        .write_stdin("token")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--account-id"));

    creds(&config_path)
        .args([
            "--user",
            USER,
            "set",
            "linkedin",
            "--account-id",
            "abc123",
            "--expires",
            "60d",
            "--stdin",
        ])
        .write_stdin("token")
        .assert()
        .success();

    let output = creds(&config_path)
        .args(["--user", USER, "list", "--format", "json"])
        .output()
        .unwrap();
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list[0]["platform"], "linkedin");
    assert_eq!(list[0]["account_id"], "abc123");
    assert!(list[0]["expires_at"].as_i64().is_some());
}

#[test]
fn test_empty_token_is_rejected() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "twitter", "--stdin"])
        .write_stdin("   \n")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot be empty"));
}

#[test]
fn test_unknown_platform_is_rejected() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "myspace", "--stdin"])
        .write_stdin("token")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown platform"));
}

#[test]
fn test_non_tty_without_stdin_flag_fails() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "twitter"])
        .write_stdin("token")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a TTY"));
}

#[test]
fn test_remove() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .args(["--user", USER, "set", "twitter", "--stdin"])
        .write_stdin("token")
        .assert()
        .success();

    creds(&config_path)
        .args(["--user", USER, "remove", "twitter", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed twitter credential"));

    creds(&config_path)
        .args(["--user", USER, "remove", "twitter", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No twitter credential found"));

    creds(&config_path)
        .args(["--user", USER, "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials stored"));
}

#[test]
fn test_user_is_required() {
    let (_temp_dir, config_path) = setup_test_env();

    creds(&config_path)
        .arg("list")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--user"));
}
