//! # stackctl Enable / Disable Handlers
//!
//! File: cli/src/commands/toggle.rs
//!
//! `stackctl enable <module> --env <env>` and `stackctl disable ...` edit the
//! environment's `enabled.yml`. Module names are checked against the catalog
//! before anything is read or written. Nothing is deployed here; the output
//! reminds the operator to run `apply`.
//!
use crate::commands::{CommandContext, EnvArg};
use crate::core::error::Result;
use crate::stack::enabled;
use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug)]
pub struct ToggleArgs {
    /// Module name from the catalog (see `stackctl modules --list`).
    pub module: String,
    #[command(flatten)]
    pub env: EnvArg,
}

pub async fn handle_enable(args: ToggleArgs) -> Result<()> {
    toggle(args, true)
}

pub async fn handle_disable(args: ToggleArgs) -> Result<()> {
    toggle(args, false)
}

fn toggle(args: ToggleArgs, enable: bool) -> Result<()> {
    debug!("Toggle args: {:?} (enable={})", args, enable);
    let ctx = CommandContext::load()?;
    ctx.catalog.require(&args.module)?;
    let cfg = ctx.env(&args.env.env)?;

    let outcome = enabled::set_module(&cfg, &ctx.catalog, &args.module, enable)?;

    println!("{} {} for {}", args.module, outcome, cfg.env);
    println!("run: stackctl apply --env {}", cfg.env);
    Ok(())
}
