//! # Docker Compose Project Wrapper
//!
//! File: cli/src/common/docker/compose.rs
//!
//! ## Overview
//!
//! Every compose invocation for an environment shares the same prefix:
//!
//! ```text
//! docker compose -f <env>/compose.yml -f <env>/compose.override.yml \
//!     --env-file <env>/.env -p <env> ...
//! ```
//!
//! `ComposeProject` owns that prefix and exposes the handful of subcommands
//! stackctl needs: service discovery (`config --services`, `ps -q`), status
//! (`ps`, `ps --format json`), `up` with profiles, `restart`, and the argument
//! list for `exec -T` used by the backup dumps.
//!
use crate::common::process;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

pub const DOCKER_BIN: &str = "docker";

/// One row of `docker compose ps --format json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerState {
    pub name: String,
    pub service: String,
    pub state: String,
    pub health: String,
    pub ports: String,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// Parses `ps --format json` output.
///
/// Compose v2.21+ prints one object per line; older releases print a single
/// JSON array. Both are accepted. Blank output means no containers.
pub fn parse_ps_json(text: &str) -> Result<Vec<ContainerState>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Failed to parse compose ps JSON array");
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .with_context(|| format!("Failed to parse compose ps line: {}", line))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    pub compose_file: PathBuf,
    pub override_file: PathBuf,
    pub env_file: PathBuf,
    pub project: String,
}

impl ComposeProject {
    pub fn for_env(cfg: &EnvConfig) -> Self {
        Self {
            compose_file: cfg.compose_path(),
            override_file: cfg.compose_override_path(),
            env_file: cfg.dotenv_path(),
            project: cfg.name().to_string(),
        }
    }

    /// `compose -f ... -f ... --env-file ... -p <project>`
    pub fn base_args(&self) -> Vec<String> {
        vec![
            "compose".to_string(),
            "-f".to_string(),
            self.compose_file.display().to_string(),
            "-f".to_string(),
            self.override_file.display().to_string(),
            "--env-file".to_string(),
            self.env_file.display().to_string(),
            "-p".to_string(),
            self.project.clone(),
        ]
    }

    /// Base args followed by `extra`.
    pub fn args<S: AsRef<str>>(&self, extra: &[S]) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(extra.iter().map(|s| s.as_ref().to_string()));
        args
    }

    /// Arguments for `up -d --remove-orphans` with one `--profile` per module.
    pub fn up_args(&self, profiles: &[String]) -> Vec<String> {
        let mut args = self.base_args();
        for profile in profiles {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.extend(["up", "-d", "--remove-orphans"].map(String::from));
        args
    }

    /// Arguments for `exec -T <service> sh -c <script>`.
    pub fn exec_args(&self, service: &str, script: &str) -> Vec<String> {
        self.args(&["exec", "-T", service, "sh", "-c", script])
    }

    pub async fn services(&self) -> Result<Vec<String>> {
        let out = process::run_capture(DOCKER_BIN, &self.args(&["config", "--services"])).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `false` when the service is not defined or compose cannot be queried.
    pub async fn service_exists(&self, service: &str) -> bool {
        match self.services().await {
            Ok(services) => services.iter().any(|s| s == service),
            Err(e) => {
                debug!("compose config --services failed: {:#}", e);
                false
            }
        }
    }

    /// `true` when `ps -q <service>` lists at least one container.
    pub async fn service_running(&self, service: &str) -> bool {
        match process::run_capture(DOCKER_BIN, &self.args(&["ps", "-q", service])).await {
            Ok(out) => !out.trim().is_empty(),
            Err(e) => {
                debug!("compose ps -q {} failed: {:#}", service, e);
                false
            }
        }
    }

    /// Human-readable `ps` table.
    pub async fn ps(&self) -> Result<String> {
        process::run_capture(DOCKER_BIN, &self.args(&["ps"])).await
    }

    pub async fn ps_json(&self) -> Result<Vec<ContainerState>> {
        let out = process::run_capture(DOCKER_BIN, &self.args(&["ps", "--format", "json"])).await?;
        parse_ps_json(&out)
    }

    pub async fn up(&self, profiles: &[String]) -> Result<()> {
        process::run_streamed(DOCKER_BIN, &self.up_args(profiles), &[]).await
    }

    pub async fn restart(&self, services: &[String]) -> Result<()> {
        let mut extra = vec!["restart".to_string()];
        extra.extend(services.iter().cloned());
        process::run_streamed(DOCKER_BIN, &self.args(&extra[..]), &[]).await
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Environment, Settings};
    use std::path::Path;

    fn project() -> ComposeProject {
        let settings = Settings {
            stack_root: Path::new("/srv/stack").to_path_buf(),
            data_root: Path::new("/srv/data").to_path_buf(),
            backup_root: Path::new("/srv/backups").to_path_buf(),
            templates_dir: Path::new("/tmp/templates").to_path_buf(),
            systemd_unit_dir: Path::new("/tmp/units").to_path_buf(),
        };
        ComposeProject::for_env(&EnvConfig::for_env(Environment::Prod, &settings))
    }

    #[test]
    fn test_base_args_layout() {
        assert_eq!(
            project().base_args(),
            vec![
                "compose",
                "-f",
                "/srv/stack/prod/compose.yml",
                "-f",
                "/srv/stack/prod/compose.override.yml",
                "--env-file",
                "/srv/stack/prod/.env",
                "-p",
                "prod",
            ]
        );
    }

    #[test]
    fn test_up_args_add_profiles_before_up() {
        let args = project().up_args(&["dozzle".to_string(), "socket-proxy".to_string()]);
        let tail: Vec<&str> = args[9..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "--profile",
                "dozzle",
                "--profile",
                "socket-proxy",
                "up",
                "-d",
                "--remove-orphans"
            ]
        );
    }

    #[test]
    fn test_exec_args() {
        let args = project().exec_args("postgres", "pg_dumpall");
        assert_eq!(&args[9..], ["exec", "-T", "postgres", "sh", "-c", "pg_dumpall"]);
    }

    #[test]
    fn test_parse_ps_json_lines() -> Result<()> {
        let text = r#"{"Name":"prod-grafana-1","Service":"grafana","State":"running","Health":"healthy","Ports":"127.0.0.1:3000->3000/tcp"}
{"Name":"prod-loki-1","Service":"loki","State":"exited","Health":"","Ports":""}
"#;
        let rows = parse_ps_json(text)?;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_running());
        assert_eq!(rows[1].service, "loki");
        assert!(!rows[1].is_running());
        Ok(())
    }

    #[test]
    fn test_parse_ps_json_array_and_empty() -> Result<()> {
        let rows = parse_ps_json(r#"[{"Service":"nginx","State":"running","Publishers":[]}]"#)?;
        assert_eq!(rows[0].service, "nginx");
        assert!(parse_ps_json("  \n")?.is_empty());
        assert!(parse_ps_json("not json").is_err());
        Ok(())
    }
}
