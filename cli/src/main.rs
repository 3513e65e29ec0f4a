//! # stackctl Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Entry point for the `stackctl` binary. It parses the command line with
//! `clap`, configures `tracing` from the `-v` count (or `RUST_LOG`), and
//! dispatches to the handler for the chosen subcommand.
//!
//! ## Architecture
//!
//! - `core`: errors, settings and environment resolution, `.env` handling,
//!   template rendering
//! - `stack`: the composition engine (catalog, enabled modules, compose
//!   assembly, assets, nginx, systemd, layout)
//! - `common`: process, docker compose, filesystem, archive, host and
//!   terminal helpers
//! - `commands`: one module per subcommand
//!
//! Every handler returns `Result<()>`. Errors are printed once here, to
//! stderr with their context chain, and turn into exit code 1.
//!
//! ## Examples
//!
//! ```bash
//! stackctl init --env dev --domain dev.example.org --email ops@example.org
//! stackctl enable grafana --env dev
//! stackctl -v apply --env dev
//! stackctl dash --watch
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod common;
mod core;
mod stack;

#[derive(Parser, Debug)]
#[command(
    name = "stackctl",
    about = "Provision and manage Docker Compose infrastructure modules per environment",
    long_about = "Manage a fixed catalog of infrastructure modules (monitoring, log viewing, \
                  reverse proxy config, backups) across the dev, qa and prod environments.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Create or refresh an environment
    Init(commands::init::InitArgs),
    /// Enable a module for an environment
    Enable(commands::toggle::ToggleArgs),
    /// Disable a module for an environment
    Disable(commands::toggle::ToggleArgs),
    /// Show enabled modules and container status
    Status(commands::status::StatusArgs),
    /// Regenerate files and bring containers up
    Apply(commands::apply::ApplyArgs),
    /// Dump databases and optionally push to restic
    Backup(commands::backup::BackupArgs),
    /// Check host prerequisites
    Doctor(commands::doctor::DoctorArgs),
    /// Interactive setup wizard
    Setup(commands::setup::SetupArgs),
    /// List or pick modules
    #[command(alias = "mods")]
    Modules(commands::modules::ModulesArgs),
    /// Health dashboard
    Dash(commands::dash::DashArgs),
    /// View and edit .env configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Init(args) => commands::init::handle_init(args).await,
        Commands::Enable(args) => commands::toggle::handle_enable(args).await,
        Commands::Disable(args) => commands::toggle::handle_disable(args).await,
        Commands::Status(args) => commands::status::handle_status(args).await,
        Commands::Apply(args) => commands::apply::handle_apply(args).await,
        Commands::Backup(args) => commands::backup::handle_backup(args).await,
        Commands::Doctor(args) => commands::doctor::handle_doctor(args).await,
        Commands::Setup(args) => commands::setup::handle_setup(args).await,
        Commands::Modules(args) => commands::modules::handle_modules(args).await,
        Commands::Dash(args) => commands::dash::handle_dash(args).await,
        Commands::Config(args) => commands::config::handle_config(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
