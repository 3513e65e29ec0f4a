//! # stackctl Backup Handler
//!
//! File: cli/src/commands/backup.rs
//!
//! ## Overview
//!
//! `stackctl backup --env <env>` (also what `backup-now.sh` and the systemd
//! timer run):
//!
//! 1. Read `.env` and ensure `<backup root>/<env>` exists.
//! 2. For each database service (`postgres`, `mariadb`): skip with a note if
//!    compose does not define it or it is not running; otherwise stream
//!    `docker compose exec -T <svc> sh -c <dump>` through gzip into
//!    `<svc>_<UTC timestamp>.sql.gz`. The dump commands read credentials
//!    from the container's own environment, so no secret is placed on the
//!    host command line.
//! 3. If both `RESTIC_REPOSITORY` and `RESTIC_PASSWORD` are set in `.env`,
//!    push the backup dir, data dir and env dir with `restic backup`.
//!
use crate::commands::{CommandContext, EnvArg};
use crate::common::archive::compression;
use crate::common::docker::{ComposeProject, DOCKER_BIN};
use crate::common::fs::io;
use crate::common::process;
use crate::core::config::EnvConfig;
use crate::core::dotenv;
use crate::core::error::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Dump databases and optionally push everything to restic")]
pub struct BackupArgs {
    #[command(flatten)]
    pub env: EnvArg,
}

/// A database dump performed inside a compose service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpJob {
    pub service: &'static str,
    pub script: &'static str,
}

pub const DUMP_JOBS: [DumpJob; 2] = [
    DumpJob {
        service: "postgres",
        script: r#"PGPASSWORD="$POSTGRES_PASSWORD" pg_dumpall -U "$POSTGRES_USER""#,
    },
    DumpJob {
        service: "mariadb",
        script: r#"mysqldump --all-databases -uroot -p"$MYSQL_ROOT_PASSWORD""#,
    },
];

pub fn backup_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn dump_path(cfg: &EnvConfig, service: &str, stamp: &str) -> PathBuf {
    cfg.env_backup_dir().join(format!("{}_{}.sql.gz", service, stamp))
}

/// Restic credentials when both are present and non-empty.
pub fn restic_credentials(vars: &BTreeMap<String, String>) -> Option<(String, String)> {
    let repo = vars.get("RESTIC_REPOSITORY").filter(|v| !v.is_empty())?;
    let pass = vars.get("RESTIC_PASSWORD").filter(|v| !v.is_empty())?;
    Some((repo.clone(), pass.clone()))
}

async fn run_dump(cfg: &EnvConfig, project: &ComposeProject, job: &DumpJob, stamp: &str) -> Result<()> {
    if !project.service_exists(job.service).await {
        println!("skip {} dump (service not defined)", job.service);
        return Ok(());
    }
    if !project.service_running(job.service).await {
        println!("skip {} dump (service not running)", job.service);
        return Ok(());
    }
    let out = dump_path(cfg, job.service, stamp);
    let bytes = compression::dump_to_gzip(DOCKER_BIN, &project.exec_args(job.service, job.script), &out)
        .await
        .with_context(|| format!("{} dump failed", job.service))?;
    info!("{} dump: {} bytes before compression", job.service, bytes);
    println!("wrote {}", out.display());
    Ok(())
}

pub async fn handle_backup(args: BackupArgs) -> Result<()> {
    info!("Handling backup command...");
    let ctx = CommandContext::load()?;
    let cfg = ctx.hydrated_env(&args.env.env)?;
    let vars = dotenv::read_vars(&cfg.dotenv_path())?;
    io::ensure_dir_exists(&cfg.env_backup_dir())?;

    let stamp = backup_timestamp(Utc::now());
    let project = ComposeProject::for_env(&cfg);
    for job in &DUMP_JOBS {
        run_dump(&cfg, &project, job, &stamp).await?;
    }

    match restic_credentials(&vars) {
        Some((repo, pass)) => {
            println!("running optional restic push");
            let targets = vec![
                "backup".to_string(),
                cfg.env_backup_dir().display().to_string(),
                cfg.env_data_dir().display().to_string(),
                cfg.env_dir.display().to_string(),
            ];
            let envs = vec![
                ("RESTIC_REPOSITORY".to_string(), repo),
                ("RESTIC_PASSWORD".to_string(), pass),
            ];
            process::run_streamed("restic", &targets, &envs)
                .await
                .context("restic backup failed")?;
        }
        None => println!("restic skipped (RESTIC_REPOSITORY/RESTIC_PASSWORD not set)"),
    }
    Ok(())
}
