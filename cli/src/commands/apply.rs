//! # stackctl Apply Handler
//!
//! File: cli/src/commands/apply.rs
//!
//! ## Overview
//!
//! `stackctl apply --env <env>` converges the running stack with the files:
//!
//! 1. Hydrate domain/email from `.env` (missing `.env` means not initialised).
//! 2. Re-run the render pipeline for the effective module list.
//! 3. `docker compose ... --profile <m>... up -d --remove-orphans`, streamed.
//!
//! `--render-only` stops after step 2, which is how the generated files can
//! be reviewed (or tested) without a Docker daemon.
//!
use crate::commands::status::modules_line;
use crate::commands::{CommandContext, EnvArg};
use crate::common::docker::ComposeProject;
use crate::common::system;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use crate::stack;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(about = "Regenerate an environment's files and bring its containers up")]
pub struct ApplyArgs {
    #[command(flatten)]
    pub env: EnvArg,
    /// Regenerate files only; do not invoke docker compose.
    #[arg(long)]
    pub render_only: bool,
}

/// Renders and (unless `render_only`) deploys; shared with the wizard and
/// module manager. Returns the effective module list.
pub async fn run_apply(ctx: &CommandContext, cfg: &EnvConfig, render_only: bool) -> Result<Vec<String>> {
    let privileged = system::is_root().await;
    let report = stack::render_environment(cfg, &ctx.settings, &ctx.catalog, privileged).await?;
    if report.units_installed == Some(false) {
        warn!("systemd units for {} were rendered but not fully installed", cfg.env);
    }
    if render_only {
        info!("--render-only: skipping docker compose up");
        return Ok(report.modules);
    }
    ComposeProject::for_env(cfg).up(&report.modules).await?;
    Ok(report.modules)
}

pub async fn handle_apply(args: ApplyArgs) -> Result<()> {
    info!("Handling apply command...");
    let ctx = CommandContext::load()?;
    let cfg = ctx.hydrated_env(&args.env.env)?;

    let modules = run_apply(&ctx, &cfg, args.render_only).await?;

    if args.render_only {
        println!("rendered {} with modules: {}", cfg.env, modules_line(&modules));
    } else {
        println!("applied {} with modules: {}", cfg.env, modules_line(&modules));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_args_parsing() {
        let args = ApplyArgs::try_parse_from(["apply", "--env", "prod", "--render-only"]).unwrap();
        assert_eq!(args.env.env, "prod");
        assert!(args.render_only);
        let args = ApplyArgs::try_parse_from(["apply", "-e", "dev"]).unwrap();
        assert!(!args.render_only);
    }
}
