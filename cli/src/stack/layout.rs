//! # Environment Layout
//!
//! File: cli/src/stack/layout.rs
//!
//! Directory scaffolding and first-run defaults for `stackctl init`. Every
//! step is idempotent: directories are created only when missing and the
//! default files (`enabled.yml`, `.env`, `compose.override.yml`) are written
//! only when absent, so re-running `init` never discards operator changes.
//!
use crate::common::fs::io;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use crate::core::templating;
use crate::stack::enabled;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Per-service persistent volume directories under `<data root>/<env>`.
pub const SERVICE_DATA_DIRS: [&str; 10] = [
    "nginx",
    "frontend",
    "backend",
    "keycloak",
    "postgres",
    "mariadb",
    "prometheus",
    "grafana",
    "loki",
    "kuma",
];

/// Every directory `init` guarantees.
pub fn required_dirs(cfg: &EnvConfig) -> Vec<PathBuf> {
    let mut dirs = vec![
        cfg.env_dir.clone(),
        cfg.data_root.clone(),
        cfg.backup_root.clone(),
        cfg.env_backup_dir(),
        cfg.env_dir.join("nginx").join("conf.d"),
        cfg.env_dir.join("systemd"),
    ];
    let data = cfg.env_data_dir();
    dirs.extend(SERVICE_DATA_DIRS.iter().map(|d| data.join(d)));
    dirs
}

pub fn ensure_dirs(cfg: &EnvConfig) -> Result<()> {
    for dir in required_dirs(cfg) {
        io::ensure_dir_exists(&dir)?;
    }
    Ok(())
}

/// Writes the default files that are missing. Returns the paths created.
pub fn ensure_default_files(cfg: &EnvConfig, templates_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    if enabled::ensure_default(cfg)? {
        created.push(cfg.manifest_path());
    }

    let dotenv = cfg.dotenv_path();
    if !dotenv.exists() {
        let text = templating::render_file(&templates_dir.join(".env.example"), &cfg.render_context())
            .context("Failed to render .env template")?;
        io::write_string_to_file_with_mode(&dotenv, &text, io::FILE_MODE)?;
        info!("Created {}", dotenv.display());
        created.push(dotenv);
    }

    let override_path = cfg.compose_override_path();
    if !override_path.exists() {
        let source = templates_dir.join("base").join("compose.override.yml");
        let content = fs::read_to_string(&source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        io::write_string_to_file_with_mode(&override_path, &content, io::FILE_MODE)?;
        info!("Created {}", override_path.display());
        created.push(override_path);
    }

    Ok(created)
}
