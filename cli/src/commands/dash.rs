//! # stackctl Dashboard
//!
//! File: cli/src/commands/dash.rs
//!
//! Health overview across environments, built from `docker compose ps
//! --format json`. An environment is `OK` when it has containers and all of
//! them are running, `DEGRADED` when any is not, and `NOT DEPLOYED` when
//! compose reports nothing or cannot be queried.
//!
//! With `--env` the container table for that environment follows the
//! overview. `--watch` redraws every `--interval` seconds until Ctrl-C.
//!
use crate::commands::{CommandContext, OptionalEnvArg};
use crate::common::docker::{ComposeProject, ContainerState};
use crate::common::ui::tables;
use crate::core::config::{self as settings_config, EnvConfig, Environment};
use crate::core::error::Result;
use chrono::Local;
use clap::Parser;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_INTERVAL_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(about = "Show deployment health across environments")]
pub struct DashArgs {
    #[command(flatten)]
    pub env: OptionalEnvArg,

    /// Keep refreshing until interrupted.
    #[arg(long)]
    pub watch: bool,

    /// Seconds between refreshes in watch mode.
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Ok,
    Degraded,
    NotDeployed,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Health::Ok => "OK",
            Health::Degraded => "DEGRADED",
            Health::NotDeployed => "NOT DEPLOYED",
        })
    }
}

pub fn classify(containers: &[ContainerState]) -> Health {
    if containers.is_empty() {
        Health::NotDeployed
    } else if containers.iter().all(ContainerState::is_running) {
        Health::Ok
    } else {
        Health::Degraded
    }
}

#[derive(Debug, Clone)]
pub struct EnvHealth {
    pub env: Environment,
    pub containers: Vec<ContainerState>,
    pub health: Health,
}

async fn probe(cfg: &EnvConfig) -> EnvHealth {
    let containers = match ComposeProject::for_env(cfg).ps_json().await {
        Ok(containers) => containers,
        Err(e) => {
            debug!("compose ps for {} failed: {:#}", cfg.env, e);
            Vec::new()
        }
    };
    EnvHealth {
        env: cfg.env,
        health: classify(&containers),
        containers,
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn print_overview(snapshot: &[EnvHealth]) {
    if snapshot.is_empty() {
        println!("No environments detected. Run 'stackctl init' first.");
        return;
    }
    let rows: Vec<Vec<String>> = snapshot
        .iter()
        .map(|s| vec![s.env.to_string(), s.containers.len().to_string(), s.health.to_string()])
        .collect();
    println!("{}", tables::render_rows(&["ENV", "CONTAINERS", "STATUS"], &rows));
}

fn print_containers(env: &EnvHealth) {
    if env.containers.is_empty() {
        println!("{}: no containers running", env.env);
        return;
    }
    let rows: Vec<Vec<String>> = env
        .containers
        .iter()
        .map(|c| vec![or_dash(&c.service), or_dash(&c.state), or_dash(&c.health), or_dash(&c.ports)])
        .collect();
    println!("{}", tables::render_rows(&["SERVICE", "STATE", "HEALTH", "PORTS"], &rows));
}

async fn draw(targets: &[EnvConfig], detailed: bool) {
    let mut snapshot = Vec::with_capacity(targets.len());
    for cfg in targets {
        snapshot.push(probe(cfg).await);
    }
    println!("stackctl dash  {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    print_overview(&snapshot);
    if detailed {
        for env in &snapshot {
            print_containers(env);
        }
    }
}

/// Runs `frame` on every tick until `stop` resolves, including while a frame
/// is still drawing. Returns the number of completed frames.
async fn watch_loop<S, F, Fut>(period: Duration, stop: S, mut frame: F) -> usize
where
    S: Future,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::pin!(stop);
    let mut ticker = tokio::time::interval(period);
    let mut frames = 0;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = &mut stop => break,
            _ = frame() => frames += 1,
        }
    }
    frames
}

pub async fn handle_dash(args: DashArgs) -> Result<()> {
    info!("Handling dash command...");
    let ctx = CommandContext::load()?;
    let targets: Vec<EnvConfig> = match args.env.env.as_deref() {
        Some(name) => vec![ctx.env(name)?],
        None => settings_config::detect_environments(&ctx.settings)
            .into_iter()
            .map(|env| EnvConfig::for_env(env, &ctx.settings))
            .collect(),
    };
    let detailed = args.env.env.is_some();

    if !args.watch {
        draw(&targets, detailed).await;
        return Ok(());
    }

    let targets = &targets;
    let frames = watch_loop(
        Duration::from_secs(args.interval),
        tokio::signal::ctrl_c(),
        move || async move {
            // Clear screen and home the cursor between frames.
            print!("\x1B[2J\x1B[H");
            draw(targets, detailed).await;
        },
    )
    .await;
    info!("Dashboard interrupted after {} frame(s)", frames);
    Ok(())
}
