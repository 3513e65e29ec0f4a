//! # stackctl Config and Modules Command Tests
//!
//! File: cli/tests/config.rs
//!
//! Non-interactive paths of `config` and `modules`.
//!
mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_config_listing_masks_secrets() {
    let sandbox = Sandbox::new();
    sandbox.init("dev");
    sandbox
        .cmd()
        .args(["config", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DOMAIN"))
        .stdout(predicate::str::contains("example.org"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("change-me").not());

    sandbox
        .cmd()
        .args(["config", "--env", "dev", "--show-secrets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("change-me"));
}

#[test]
fn test_config_set_reports_affected_services() {
    let sandbox = Sandbox::new();
    sandbox.init("dev");
    sandbox
        .cmd()
        .args(["config", "--env", "dev", "--set", "DOMAIN=dev.example.net"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved 1 change(s): DOMAIN"))
        .stdout(predicate::str::contains("affected services: backend, frontend, keycloak, nginx"))
        .stdout(predicate::str::contains("restart backend frontend keycloak nginx"));

    let dotenv = sandbox.read("dev", ".env");
    assert!(dotenv.contains("DOMAIN=dev.example.net"));
    assert!(dotenv.starts_with("# --- Core ---\n"));
}

#[test]
fn test_config_generate_secret_only() {
    let sandbox = Sandbox::new();
    sandbox.init("qa");
    sandbox
        .cmd()
        .args(["config", "--env", "qa", "--generate", "JWT_SECRET"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generated a new value for JWT_SECRET"));
    let line = sandbox
        .read("qa", ".env")
        .lines()
        .find(|l| l.starts_with("JWT_SECRET="))
        .map(str::to_string)
        .unwrap();
    let value = line.trim_start_matches("JWT_SECRET=");
    assert_eq!(value.len(), 32);
    assert!(value.chars().all(|c| c.is_ascii_hexdigit()));

    sandbox
        .cmd()
        .args(["config", "--env", "qa", "--generate", "DOMAIN"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOMAIN is not a secret key"));
}

#[test]
fn test_config_validate_flags_weak_values() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["init", "--env", "dev"]).assert().success();
    sandbox
        .cmd()
        .args(["config", "--env", "dev", "--set", "SECRET_KEY=short", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[WARN] DOMAIN: still using placeholder 'example.com'"))
        .stdout(predicate::str::contains("[WARN] SECRET_KEY: password too short (< 8 chars)"))
        .stdout(predicate::str::contains("[ OK ] ADMIN_EMAIL: set"));
}

#[test]
fn test_config_without_environments_fails() {
    Sandbox::new()
        .cmd()
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no environments found; run 'stackctl init' first"));
}

#[test]
fn test_modules_list_shows_status() {
    let sandbox = Sandbox::new();
    sandbox.init("dev");
    sandbox.cmd().args(["enable", "dozzle", "--env", "dev"]).assert().success();
    sandbox
        .cmd()
        .args(["modules", "--list", "--env", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("environment: dev"))
        .stdout(predicate::str::contains("socket-proxy"))
        .stdout(predicate::str::contains("dependency"))
        .stdout(predicate::str::contains("enabled"))
        .stdout(predicate::str::contains("Uptime Kuma monitoring"));
}

#[test]
fn test_dash_without_environments() {
    Sandbox::new()
        .cmd()
        .arg("dash")
        .assert()
        .success()
        .stdout(predicate::str::contains("No environments detected"));
}
