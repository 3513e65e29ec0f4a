//! # stackctl Init Handler
//!
//! File: cli/src/commands/init.rs
//!
//! ## Overview
//!
//! `stackctl init --env <env> [--domain D] [--email E]` prepares an
//! environment from nothing, or refreshes an existing one:
//!
//! 1. Create the directory layout (env dir, nginx/systemd dirs, per-service
//!    data dirs, backup dir).
//! 2. Settle domain and email. Explicit flags win and are written into an
//!    existing `.env` in place; otherwise values come from that `.env`;
//!    otherwise the `example.com` placeholders are used.
//! 3. Write first-run defaults that are missing (`enabled.yml`, `.env`,
//!    `compose.override.yml`).
//! 4. Run the render pipeline (compose, assets, nginx, backup script, units).
//!
//! Re-running `init` is safe; nothing the operator edited is overwritten
//! except the generated files the pipeline always owns.
//!
use crate::commands::{CommandContext, EnvArg};
use crate::common::system;
use crate::core::config::{EnvConfig, DOMAIN_KEY, EMAIL_KEY};
use crate::core::dotenv;
use crate::core::error::Result;
use crate::stack::{self, layout};
use clap::Parser;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const DEFAULT_DOMAIN: &str = "example.com";
pub const DEFAULT_EMAIL: &str = "admin@example.com";

#[derive(Parser, Debug)]
#[command(about = "Create or refresh an environment's directory layout and generated files")]
pub struct InitArgs {
    #[command(flatten)]
    pub env: EnvArg,
    /// Base domain for the proxies (default: existing .env value or example.com).
    #[arg(long)]
    pub domain: Option<String>,
    /// Operator email for certificates and alerts (default: existing .env value or admin@example.com).
    #[arg(long)]
    pub email: Option<String>,
}

/// Applies the domain/email precedence to `cfg`, updating an existing `.env`
/// when flags were given.
fn settle_identity(cfg: &mut EnvConfig, domain: Option<&str>, email: Option<&str>) -> Result<()> {
    let dotenv_path = cfg.dotenv_path();
    if dotenv_path.exists() {
        let mut updates = BTreeMap::new();
        if let Some(d) = domain {
            updates.insert(DOMAIN_KEY.to_string(), d.to_string());
        }
        if let Some(e) = email {
            updates.insert(EMAIL_KEY.to_string(), e.to_string());
        }
        if !updates.is_empty() {
            dotenv::update_file(&dotenv_path, &updates)?;
            info!("Updated {} key(s) in {}", updates.len(), dotenv_path.display());
        }
    }

    cfg.domain = domain.unwrap_or_default().to_string();
    cfg.email = email.unwrap_or_default().to_string();
    if dotenv_path.exists() {
        cfg.hydrate_from_dotenv()?;
    }
    if cfg.domain.is_empty() {
        cfg.domain = DEFAULT_DOMAIN.to_string();
    }
    if cfg.email.is_empty() {
        cfg.email = DEFAULT_EMAIL.to_string();
    }
    debug!("init identity: domain={}, email={}", cfg.domain, cfg.email);
    Ok(())
}

/// Performs the full init for `cfg`; shared with the setup wizard.
pub async fn run_init(
    ctx: &CommandContext,
    cfg: &mut EnvConfig,
    domain: Option<&str>,
    email: Option<&str>,
) -> Result<stack::RenderReport> {
    layout::ensure_dirs(cfg)?;
    settle_identity(cfg, domain, email)?;
    let created = layout::ensure_default_files(cfg, &ctx.settings.templates_dir)?;
    for path in &created {
        debug!("created default {}", path.display());
    }
    let privileged = system::is_root().await;
    stack::render_environment(cfg, &ctx.settings, &ctx.catalog, privileged).await
}

pub async fn handle_init(args: InitArgs) -> Result<()> {
    info!("Handling init command...");
    debug!("Init args: {:?}", args);
    let ctx = CommandContext::load()?;
    let mut cfg = ctx.env(&args.env.env)?;

    run_init(&ctx, &mut cfg, args.domain.as_deref(), args.email.as_deref()).await?;

    println!("initialized {} at {}", cfg.env, cfg.env_dir.display());
    println!("next: stackctl apply --env {}", cfg.env);
    Ok(())
}
