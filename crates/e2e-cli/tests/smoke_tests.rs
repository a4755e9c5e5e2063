//! Smoke tests for the crm-e2e CLI
//!
//! Only commands that need no browser are exercised end to end.

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the crm-e2e binary with a clean environment
fn crm_e2e() -> Command {
    let mut cmd = Command::cargo_bin("crm-e2e").expect("crm-e2e binary should exist");
    for var in [
        "CRM_E2E_CONFIG",
        "CRM_E2E_LOGIN_URL",
        "CRM_E2E_INBOX_URL",
        "CRM_E2E_RECIPIENT",
        "CRM_E2E_RUN_SUFFIX",
        "CRM_E2E_USERNAME",
        "CRM_E2E_PASSWORD",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    crm_e2e()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    crm_e2e()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("code"))
        .stdout(predicate::str::contains("unique"));
}

#[test]
fn test_no_args_fails() {
    crm_e2e().assert().failure();
}

// ============================================================================
// unique
// ============================================================================

#[test]
fn test_unique_value_with_suffix() {
    crm_e2e()
        .args(["unique", "Acme Corp", "--suffix", "run42"])
        .assert()
        .success()
        .stdout("Acme Corp_run42\n");
}

#[test]
fn test_unique_email_keeps_domain() {
    crm_e2e()
        .args(["unique", "qa@example.com", "--email", "--suffix", "run42"])
        .assert()
        .success()
        .stdout("qa_run42@example.com\n");
}

#[test]
fn test_unique_uses_pinned_run_suffix() {
    crm_e2e()
        .env("CRM_E2E_RUN_SUFFIX", "ci7")
        .args(["unique", "Lead"])
        .assert()
        .success()
        .stdout("Lead_ci7\n");
}

#[test]
fn test_unique_rejects_empty_suffix() {
    crm_e2e()
        .args(["unique", "Lead", "--suffix", "!!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_defaults() {
    crm_e2e()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("login_url:"))
        .stdout(predicate::str::contains("max_attempts: 3"));
}

#[test]
fn test_config_from_file_and_env() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("suite.yaml");
    fs::write(&path, "inbox:\n  retry:\n    max_attempts: 7\n").unwrap();

    crm_e2e()
        .env("CRM_E2E_LOGIN_URL", "https://staging.crm.test/login")
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("max_attempts: 7"))
        .stdout(predicate::str::contains("https://staging.crm.test/login"));
}

#[test]
fn test_config_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    crm_e2e()
        .args(["config", "--config"])
        .arg(temp.path().join("absent.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

// ============================================================================
// login
// ============================================================================

#[test]
fn test_login_without_credentials_fails_fast() {
    crm_e2e()
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CRM_E2E_USERNAME"));
}
