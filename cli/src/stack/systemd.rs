//! # Systemd Unit and Backup Script Materializer
//!
//! File: cli/src/stack/systemd.rs
//!
//! ## Overview
//!
//! Each environment gets three rendered units in `<env dir>/systemd/`:
//!
//! | template                  | written as                        |
//! |---------------------------|-----------------------------------|
//! | `stackctl-env.service`    | `stackctl-<env>.service`          |
//! | `stackctl-backup.service` | `stackctl-backup-<env>.service`   |
//! | `stackctl-backup.timer`   | `stackctl-backup-<env>.timer`     |
//!
//! plus `<env dir>/backup-now.sh`, the script the backup service runs.
//!
//! With root privileges the units are also copied into the system unit
//! directory and enabled. That step is best-effort: every failure is logged
//! with `warn!` and the command carries on, since the environment's own copy
//! is already correct and the operator can install it by hand.
//!
use crate::common::fs::io;
use crate::common::process;
use crate::core::config::{EnvConfig, Environment};
use crate::core::error::Result;
use crate::core::templating;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const UNIT_MODE: u32 = 0o644;
pub const SCRIPT_MODE: u32 = 0o750;
pub const BACKUP_SCRIPT: &str = "backup-now.sh";

/// A unit template and its per-environment filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    pub template: &'static str,
    pub target: String,
}

pub fn unit_files(env: Environment) -> [UnitFile; 3] {
    [
        UnitFile {
            template: "stackctl-env.service",
            target: format!("stackctl-{}.service", env),
        },
        UnitFile {
            template: "stackctl-backup.service",
            target: format!("stackctl-backup-{}.service", env),
        },
        UnitFile {
            template: "stackctl-backup.timer",
            target: format!("stackctl-backup-{}.timer", env),
        },
    ]
}

pub fn units_dir(cfg: &EnvConfig) -> PathBuf {
    cfg.env_dir.join("systemd")
}

/// Renders the unit trio into the environment. Returns the written paths.
pub fn write_units(cfg: &EnvConfig, templates_dir: &Path) -> Result<Vec<PathBuf>> {
    let target_dir = units_dir(cfg);
    io::ensure_dir_exists(&target_dir)?;
    let ctx = cfg.render_context();

    let mut written = Vec::new();
    for unit in unit_files(cfg.env) {
        let source = templates_dir.join("systemd").join(unit.template);
        let text = templating::render_file(&source, &ctx)
            .with_context(|| format!("Failed to render systemd unit {}", unit.template))?;
        let target = target_dir.join(&unit.target);
        io::write_string_to_file_with_mode(&target, &text, UNIT_MODE)?;
        written.push(target);
    }
    info!("Rendered {} systemd unit(s) for {}", written.len(), cfg.env);
    Ok(written)
}

pub fn write_backup_script(cfg: &EnvConfig, templates_dir: &Path) -> Result<PathBuf> {
    let source = templates_dir.join("systemd").join(BACKUP_SCRIPT);
    let text = templating::render_file(&source, &cfg.render_context())
        .context("Failed to render backup script")?;
    let target = cfg.env_dir.join(BACKUP_SCRIPT);
    io::write_string_to_file_with_mode(&target, &text, SCRIPT_MODE)?;
    Ok(target)
}

/// Copies rendered units into `unit_dir`, reloads systemd and enables the
/// service and timer. Returns `true` only if every step succeeded.
pub async fn install_units(cfg: &EnvConfig, unit_dir: &Path, rendered: &[PathBuf]) -> bool {
    let mut ok = true;
    for source in rendered {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = unit_dir.join(name);
        if let Err(e) = fs::copy(source, &target).and_then(|_| {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(UNIT_MODE))
        }) {
            warn!("Could not install {}: {}", target.display(), e);
            ok = false;
        }
    }

    let env = cfg.name();
    let steps: [Vec<String>; 3] = [
        vec!["daemon-reload".into()],
        vec!["enable".into(), format!("stackctl-{}.service", env)],
        vec!["enable".into(), format!("stackctl-backup-{}.timer", env)],
    ];
    for args in steps {
        if let Err(e) = process::run_streamed("systemctl", &args, &[]).await {
            warn!("systemctl {} failed (ignored): {:#}", args.join(" "), e);
            ok = false;
        }
    }
    if ok {
        info!("Installed and enabled systemd units for {}", env);
    }
    ok
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, EnvConfig, PathBuf) {
        let temp = tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let settings = Settings {
            stack_root: root.join("stack"),
            data_root: root.join("data"),
            backup_root: root.join("backups"),
            templates_dir: root.join("templates"),
            systemd_unit_dir: root.join("units"),
        };
        let cfg = EnvConfig::for_env(Environment::Qa, &settings);
        let dir = settings.templates_dir.join("systemd");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stackctl-env.service"), "WorkingDirectory={{ stack_root }}/{{ env }}\n").unwrap();
        fs::write(dir.join("stackctl-backup.service"), "ExecStart={{ stack_root }}/{{ env }}/backup-now.sh\n").unwrap();
        fs::write(dir.join("stackctl-backup.timer"), "OnCalendar=daily\n").unwrap();
        fs::write(dir.join("backup-now.sh"), "#!/bin/sh\nstackctl backup --env {{ env }}\n").unwrap();
        (temp, cfg, settings.templates_dir)
    }

    #[test]
    fn test_unit_names_are_env_specific() {
        let names: Vec<String> = unit_files(Environment::Prod).into_iter().map(|u| u.target).collect();
        assert_eq!(
            names,
            vec!["stackctl-prod.service", "stackctl-backup-prod.service", "stackctl-backup-prod.timer"]
        );
    }

    #[test]
    fn test_write_units_renders_and_sets_mode() -> Result<()> {
        let (temp, cfg, templates) = setup();
        let written = write_units(&cfg, &templates)?;
        assert_eq!(written.len(), 3);

        let service = fs::read_to_string(units_dir(&cfg).join("stackctl-qa.service"))?;
        assert_eq!(
            service,
            format!("WorkingDirectory={}/qa\n", temp.path().join("stack").display())
        );
        let mode = fs::metadata(&written[2])?.permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        Ok(())
    }

    #[test]
    fn test_backup_script_is_executable() -> Result<()> {
        let (_temp, cfg, templates) = setup();
        let path = write_backup_script(&cfg, &templates)?;
        assert_eq!(fs::read_to_string(&path)?, "#!/bin/sh\nstackctl backup --env qa\n");
        assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o750);
        Ok(())
    }

    #[tokio::test]
    async fn test_install_units_never_errors() -> Result<()> {
        let (temp, cfg, templates) = setup();
        let written = write_units(&cfg, &templates)?;
        let unit_dir = temp.path().join("missing/unit/dir");
        assert!(!install_units(&cfg, &unit_dir, &written).await);
        Ok(())
    }
}
