//! # stackctl Integration Test Helpers
//!
//! File: cli/tests/common.rs
//!
//! Each test gets a `Sandbox`: a temporary directory holding the stack,
//! data and backup roots plus a systemd unit directory, with the repository's
//! `templates/` tree wired in through `STACKCTL_TEMPLATES`. Commands built
//! from it never touch `/srv` or the operator's settings file.
//!
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("templates")
}

pub struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("Failed to create sandbox directory"),
        }
    }

    pub fn stack_root(&self) -> PathBuf {
        self.root.path().join("stack")
    }

    pub fn env_dir(&self, env: &str) -> PathBuf {
        self.stack_root().join(env)
    }

    pub fn data_root(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn backup_root(&self) -> PathBuf {
        self.root.path().join("backups")
    }

    pub fn read(&self, env: &str, relative: &str) -> String {
        std::fs::read_to_string(self.env_dir(env).join(relative))
            .unwrap_or_else(|e| panic!("Failed to read {}/{}: {}", env, relative, e))
    }

    /// `stackctl` with every root pointed into the sandbox.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("stackctl").expect("Failed to find stackctl binary for testing");
        cmd.env("STACKCTL_STACK_ROOT", self.stack_root())
            .env("STACKCTL_DATA_ROOT", self.data_root())
            .env("STACKCTL_BACKUP_ROOT", self.backup_root())
            .env("STACKCTL_TEMPLATES", templates_dir())
            .env("STACKCTL_SYSTEMD_DIR", self.root.path().join("units"))
            .env("STACKCTL_CONFIG", self.root.path().join("no-settings.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    /// Runs `init` for `env` and asserts success.
    pub fn init(&self, env: &str) {
        self.cmd()
            .args(["init", "--env", env, "--domain", "example.org", "--email", "ops@example.org"])
            .assert()
            .success();
    }
}
