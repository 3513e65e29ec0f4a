//! # Nginx Fragment Materializer
//!
//! File: cli/src/stack/nginx.rs
//!
//! Renders `templates/nginx/*.conf` into `<env dir>/nginx/conf.d/`. The three
//! core proxies (app, API, identity provider) are always rewritten. Optional
//! fragments follow their module: written while the module is effective,
//! removed otherwise. Removing an absent fragment is a no-op.
//!
use crate::common::fs::io;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use crate::core::templating::{self, RenderContext};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fragments rendered for every environment.
pub const CORE_FRAGMENTS: [&str; 3] = ["app.conf", "api.conf", "kc.conf"];

/// Module-owned fragments: `(module, file)`.
pub const MODULE_FRAGMENTS: [(&str, &str); 2] = [("grafana", "grafana.conf"), ("kuma", "kuma.conf")];

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NginxReport {
    pub written: Vec<String>,
    pub removed: Vec<String>,
}

pub fn conf_dir(cfg: &EnvConfig) -> PathBuf {
    cfg.env_dir.join("nginx").join("conf.d")
}

fn render_fragment(templates_dir: &Path, ctx: &RenderContext, target_dir: &Path, file: &str) -> Result<()> {
    let source = templates_dir.join("nginx").join(file);
    let text = templating::render_file(&source, ctx)
        .with_context(|| format!("Failed to render nginx fragment {}", file))?;
    io::write_string_to_file_with_mode(&target_dir.join(file), &text, io::FILE_MODE)
}

pub fn write_nginx_confs(cfg: &EnvConfig, templates_dir: &Path, modules: &[String]) -> Result<NginxReport> {
    let target_dir = conf_dir(cfg);
    io::ensure_dir_exists(&target_dir)?;
    let ctx = cfg.render_context();
    let mut report = NginxReport::default();

    for file in CORE_FRAGMENTS {
        render_fragment(templates_dir, &ctx, &target_dir, file)?;
        report.written.push(file.to_string());
    }

    for (module, file) in MODULE_FRAGMENTS {
        if modules.iter().any(|m| m == module) {
            render_fragment(templates_dir, &ctx, &target_dir, file)?;
            report.written.push(file.to_string());
        } else if io::remove_file_if_exists(&target_dir.join(file))? {
            debug!("Removed nginx fragment {} ({} disabled)", file, module);
            report.removed.push(file.to_string());
        }
    }

    info!(
        "nginx fragments for {}: {} written, {} removed",
        cfg.env,
        report.written.len(),
        report.removed.len()
    );
    Ok(report)
}
