//! # stackctl Doctor Handler
//!
//! File: cli/src/commands/doctor.rs
//!
//! ## Overview
//!
//! `stackctl doctor` checks the host prerequisites and prints one line per
//! check: `[ OK ] <name>` or `[WARN] <name>: <reason>`. Warnings never fail
//! the command. The same checks back the setup wizard's preflight screen.
//!
//! Checks, in order: docker binary on PATH, `docker compose version`,
//! `docker info`, stack root writable, data root writable, free space on the
//! stack root's filesystem, and whether ports 80/443 are already bound.
//!
use crate::commands::CommandContext;
use crate::common::docker::DOCKER_BIN;
use crate::common::{network, process, system};
use crate::core::config::Settings;
use crate::core::error::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Check host prerequisites (docker, permissions, disk, ports)")]
pub struct DoctorArgs {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    /// `None` when the check passed.
    pub problem: Option<String>,
}

impl CheckResult {
    fn from_result(name: String, result: Result<()>) -> Self {
        Self {
            name,
            problem: result.err().map(|e| format!("{:#}", e)),
        }
    }

    pub fn passed(&self) -> bool {
        self.problem.is_none()
    }

    /// `[ OK ] name` or `[WARN] name: reason`.
    pub fn line(&self) -> String {
        match &self.problem {
            None => format!("[ OK ] {}", self.name),
            Some(reason) => format!("[WARN] {}: {}", self.name, reason),
        }
    }
}

async fn check_disk(settings: &Settings) -> Result<()> {
    let free = system::free_space_gib(&settings.stack_root).await?;
    if free < system::MIN_FREE_GIB {
        anyhow::bail!("free space {}GiB < {}GiB", free, system::MIN_FREE_GIB);
    }
    Ok(())
}

async fn check_ports() -> Result<()> {
    let busy = network::ports_in_use(&network::PROXY_PORTS).await?;
    if !busy.is_empty() {
        let list: Vec<String> = busy.iter().map(u16::to_string).collect();
        anyhow::bail!("port(s) {} already in use", list.join("/"));
    }
    Ok(())
}

/// Runs every check and returns the results in display order.
pub async fn run_checks(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();
    results.push(CheckResult::from_result(
        "docker binary".into(),
        system::find_tool(DOCKER_BIN).map(|_| ()),
    ));
    results.push(CheckResult::from_result(
        "docker compose".into(),
        process::run_capture(DOCKER_BIN, &["compose".into(), "version".into()])
            .await
            .map(|_| ()),
    ));
    results.push(CheckResult::from_result(
        "docker daemon".into(),
        process::run_capture(DOCKER_BIN, &["info".into()]).await.map(|_| ()),
    ));
    results.push(CheckResult::from_result(
        format!("{} writable", settings.stack_root.display()),
        system::check_writable(&settings.stack_root),
    ));
    results.push(CheckResult::from_result(
        format!("{} writable", settings.data_root.display()),
        system::check_writable(&settings.data_root),
    ));
    results.push(CheckResult::from_result(
        format!(
            "disk space >= {}GiB on {}",
            system::MIN_FREE_GIB,
            settings.stack_root.display()
        ),
        check_disk(settings).await,
    ));
    results.push(CheckResult::from_result("ports 80/443 status".into(), check_ports().await));
    results
}

pub async fn handle_doctor(_args: DoctorArgs) -> Result<()> {
    info!("Handling doctor command...");
    let ctx = CommandContext::load()?;
    println!("stackctl doctor");
    println!("runtime: {}", system::platform());
    for check in run_checks(&ctx.settings).await {
        println!("{}", check.line());
    }
    Ok(())
}
