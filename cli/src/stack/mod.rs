//! # stackctl Composition Engine (`stack`)
//!
//! File: cli/src/stack/mod.rs
//!
//! ## Overview
//!
//! Turns an environment's declarative state (`enabled.yml` + `.env`) and the
//! shipped template tree into the files `docker compose` and systemd consume.
//!
//! - **`catalog`**: The fixed module registry and its dependency graph.
//! - **`enabled`**: The per-environment manifest and the effective module list.
//! - **`compose`**: Base + overlay deep-merge producing `compose.yml`.
//! - **`assets`**: No-clobber mirroring of module asset trees.
//! - **`nginx`**: Core and module-owned proxy fragments.
//! - **`systemd`**: Unit trio, backup script, optional privileged install.
//! - **`layout`**: Directory scaffolding and first-run defaults for `init`.
//!
//! `render_environment` runs the whole pipeline in a fixed order and is what
//! both `init` and `apply` call. Every step rewrites its outputs from scratch
//! (or skips existing operator-owned files), so a failed run is safe to retry.
//!
pub mod assets;
pub mod catalog;
pub mod compose;
pub mod enabled;
pub mod layout;
pub mod nginx;
pub mod systemd;

use crate::common::fs::copy::MirrorStats;
use crate::core::config::{EnvConfig, Settings};
use crate::core::error::Result;
use catalog::Catalog;
use std::path::PathBuf;
use tracing::info;

/// What one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub modules: Vec<String>,
    pub compose_path: PathBuf,
    pub assets: MirrorStats,
    pub nginx: nginx::NginxReport,
    pub backup_script: PathBuf,
    pub units: Vec<PathBuf>,
    /// `None` when not privileged, otherwise whether the install fully succeeded.
    pub units_installed: Option<bool>,
}

/// Regenerates every derived file for `cfg`.
///
/// `privileged` enables the best-effort copy of units into
/// `settings.systemd_unit_dir` followed by `systemctl` reload/enable.
pub async fn render_environment(
    cfg: &EnvConfig,
    settings: &Settings,
    catalog: &Catalog,
    privileged: bool,
) -> Result<RenderReport> {
    let templates = &settings.templates_dir;
    let modules = enabled::effective_modules(cfg, catalog)?;
    info!("Rendering {} with modules: [{}]", cfg.env, modules.join(", "));

    let compose_path = compose::write_compose(cfg, templates, &modules)?;
    let assets = assets::sync_module_assets(cfg, templates)?;
    let nginx = nginx::write_nginx_confs(cfg, templates, &modules)?;
    let backup_script = systemd::write_backup_script(cfg, templates)?;
    let units = systemd::write_units(cfg, templates)?;

    let units_installed = if privileged {
        Some(systemd::install_units(cfg, &settings.systemd_unit_dir, &units).await)
    } else {
        None
    };

    Ok(RenderReport {
        modules,
        compose_path,
        assets,
        nginx,
        backup_script,
        units,
        units_installed,
    })
}
