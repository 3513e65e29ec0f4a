//! # stackctl Status Handler
//!
//! File: cli/src/commands/status.rs
//!
//! Prints the environment name, its directory, the effective module list and
//! `docker compose ps`. When compose cannot be queried (daemon down, nothing
//! deployed yet) its output is shown under a notice and the command still
//! succeeds: the file-level status is valid on its own.
//!
use crate::commands::{CommandContext, EnvArg};
use crate::common::docker::ComposeProject;
use crate::core::error::{Result, StackError};
use crate::stack::enabled;
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(about = "Show enabled modules and container status for an environment")]
pub struct StatusArgs {
    #[command(flatten)]
    pub env: EnvArg,
}

/// Comma-joined module list, `(none)` when empty.
pub fn modules_line(modules: &[String]) -> String {
    if modules.is_empty() {
        "(none)".to_string()
    } else {
        modules.join(", ")
    }
}

pub async fn handle_status(args: StatusArgs) -> Result<()> {
    info!("Handling status command...");
    let ctx = CommandContext::load()?;
    let cfg = ctx.hydrated_env(&args.env.env)?;
    let modules = enabled::effective_modules(&cfg, &ctx.catalog)?;

    println!("environment: {}", cfg.env);
    println!("path: {}", cfg.env_dir.display());
    println!("enabled modules: {}", modules_line(&modules));

    match ComposeProject::for_env(&cfg).ps().await {
        Ok(table) => println!("{}", table.trim_end()),
        Err(e) => {
            debug!("compose ps failed: {:#}", e);
            let detail = match e.downcast_ref::<StackError>() {
                Some(StackError::ExternalCommand { output, .. }) => output.trim().to_string(),
                _ => e.to_string(),
            };
            println!("docker compose status unavailable:");
            println!("{}", detail);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modules_line() {
        assert_eq!(modules_line(&[]), "(none)");
        assert_eq!(
            modules_line(&["dozzle".to_string(), "socket-proxy".to_string()]),
            "dozzle, socket-proxy"
        );
    }
}
