//! # stackctl Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module resolves everything a command needs to know about *where* it
//! operates: the three filesystem roots (stack, data, backup), the template
//! source directory, the systemd unit directory, and, per invocation, the
//! `EnvConfig` for one named environment.
//!
//! ## Architecture
//!
//! Settings are resolved once per process, in order of precedence:
//! 1. Environment variables (`STACKCTL_STACK_ROOT`, `STACKCTL_DATA_ROOT`,
//!    `STACKCTL_BACKUP_ROOT`, `STACKCTL_TEMPLATES`, `STACKCTL_SYSTEMD_DIR`)
//! 2. The operator settings file `<config dir>/stackctl/config.toml`
//!    (or the file named by `STACKCTL_CONFIG`)
//! 3. Built-in defaults (`/srv/stack`, `/srv/data`, `/srv/backups`)
//!
//! `EnvConfig` is then derived from `Settings` for a validated environment
//! name. Domain and admin email start empty unless the caller supplies them
//! and can be hydrated from the environment's `.env` file.
//!
//! ## Examples
//!
//! ```rust
//! let settings = config::load_settings()?;
//! let mut cfg = EnvConfig::resolve("prod", &settings)?;
//! cfg.hydrate_from_dotenv()?;
//! println!("{} -> {}", cfg.env, cfg.env_dir.display());
//! ```
//!
use crate::core::dotenv;
use crate::core::error::{Result, StackError};
use crate::core::templating::RenderContext;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_STACK_ROOT: &str = "/srv/stack";
pub const DEFAULT_DATA_ROOT: &str = "/srv/data";
pub const DEFAULT_BACKUP_ROOT: &str = "/srv/backups";
pub const DEFAULT_SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

pub const ENV_STACK_ROOT: &str = "STACKCTL_STACK_ROOT";
pub const ENV_DATA_ROOT: &str = "STACKCTL_DATA_ROOT";
pub const ENV_BACKUP_ROOT: &str = "STACKCTL_BACKUP_ROOT";
pub const ENV_TEMPLATES: &str = "STACKCTL_TEMPLATES";
pub const ENV_SYSTEMD_DIR: &str = "STACKCTL_SYSTEMD_DIR";
pub const ENV_CONFIG_FILE: &str = "STACKCTL_CONFIG";

pub const DOTENV_FILENAME: &str = ".env";
pub const MANIFEST_FILENAME: &str = "enabled.yml";
pub const COMPOSE_FILENAME: &str = "compose.yml";
pub const COMPOSE_OVERRIDE_FILENAME: &str = "compose.override.yml";

/// Keys in `.env` that carry the environment's domain and operator email.
pub const DOMAIN_KEY: &str = "DOMAIN";
pub const EMAIL_KEY: &str = "ADMIN_EMAIL";

/// The fixed set of deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Environment {
    Dev,
    Qa,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Qa, Environment::Prod];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Qa => "qa",
            Environment::Prod => "prod",
        }
    }

    /// Trims and validates an environment name.
    pub fn parse(name: &str) -> std::result::Result<Self, StackError> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == trimmed)
            .ok_or_else(|| StackError::InvalidEnvironment {
                given: trimmed.to_string(),
                allowed: Self::ALL
                    .iter()
                    .map(|e| e.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of the optional operator settings file.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub stack_root: Option<String>,
    pub data_root: Option<String>,
    pub backup_root: Option<String>,
    pub templates_dir: Option<String>,
    pub systemd_unit_dir: Option<String>,
}

/// Process-wide resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub stack_root: PathBuf,
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
    pub templates_dir: PathBuf,
    pub systemd_unit_dir: PathBuf,
}

/// Loads settings from the environment, the optional settings file and defaults.
pub fn load_settings() -> Result<Settings> {
    let file = load_settings_file()?.unwrap_or_default();
    let settings = resolve_settings(&file, |key| std::env::var(key).ok());
    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

fn load_settings_file() -> Result<Option<SettingsFile>> {
    let path = match std::env::var(ENV_CONFIG_FILE)
        .ok()
        .filter(|v| !v.trim().is_empty())
    {
        Some(explicit) => PathBuf::from(shellexpand::tilde(explicit.trim()).into_owned()),
        None => match ProjectDirs::from("", "", "stackctl") {
            Some(dirs) => dirs.config_dir().join("config.toml"),
            None => {
                debug!("Could not determine user config directory.");
                return Ok(None);
            }
        },
    };
    if !path.is_file() {
        debug!("No settings file at {}", path.display());
        return Ok(None);
    }
    info!("Loading settings from: {}", path.display());
    parse_settings_file(&path).map(Some)
}

fn parse_settings_file(path: &Path) -> Result<SettingsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    toml::from_str(&content).map_err(|e| {
        anyhow!(StackError::Config(format!(
            "invalid settings file {}: {}",
            path.display(),
            e
        )))
    })
}

/// Applies precedence: environment variable, then settings file, then default.
///
/// `lookup` abstracts the process environment so tests can supply their own.
pub fn resolve_settings<F>(file: &SettingsFile, lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |var: &str, from_file: &Option<String>| -> Option<PathBuf> {
        lookup(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| from_file.clone().filter(|v| !v.trim().is_empty()))
            .map(|v| PathBuf::from(shellexpand::tilde(v.trim()).into_owned()))
    };

    Settings {
        stack_root: pick(ENV_STACK_ROOT, &file.stack_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STACK_ROOT)),
        data_root: pick(ENV_DATA_ROOT, &file.data_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT)),
        backup_root: pick(ENV_BACKUP_ROOT, &file.backup_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_ROOT)),
        templates_dir: pick(ENV_TEMPLATES, &file.templates_dir)
            .unwrap_or_else(find_templates_dir),
        systemd_unit_dir: pick(ENV_SYSTEMD_DIR, &file.systemd_unit_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSTEMD_UNIT_DIR)),
    }
}

/// Searches the usual install locations for the template tree.
fn find_templates_dir() -> PathBuf {
    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(bin_dir) = exe.parent() {
            candidates.push(bin_dir.join("..").join("templates"));
            candidates.push(bin_dir.join("templates"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("templates"));
    }
    candidates.push(PathBuf::from("/usr/local/share/stackctl/templates"));
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".stackctl").join("repo").join("templates"));
    }

    candidates
        .into_iter()
        .find(|c| c.is_dir())
        .unwrap_or_else(|| PathBuf::from("templates"))
}

/// Environments whose directory already exists under the stack root.
pub fn detect_environments(settings: &Settings) -> Vec<Environment> {
    Environment::ALL
        .into_iter()
        .filter(|env| settings.stack_root.join(env.as_str()).is_dir())
        .collect()
}

/// Resolved, per-invocation view of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub env: Environment,
    pub stack_root: PathBuf,
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
    pub env_dir: PathBuf,
    pub domain: String,
    pub email: String,
}

impl EnvConfig {
    /// Validates `name` and derives all paths from `settings`.
    pub fn resolve(name: &str, settings: &Settings) -> Result<Self> {
        let env = Environment::parse(name)?;
        Ok(Self::for_env(env, settings))
    }

    pub fn for_env(env: Environment, settings: &Settings) -> Self {
        Self {
            env,
            stack_root: settings.stack_root.clone(),
            data_root: settings.data_root.clone(),
            backup_root: settings.backup_root.clone(),
            env_dir: settings.stack_root.join(env.as_str()),
            domain: String::new(),
            email: String::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.env.as_str()
    }

    pub fn network_name(&self) -> String {
        format!("{}_net", self.env)
    }

    pub fn dotenv_path(&self) -> PathBuf {
        self.env_dir.join(DOTENV_FILENAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.env_dir.join(MANIFEST_FILENAME)
    }

    pub fn compose_path(&self) -> PathBuf {
        self.env_dir.join(COMPOSE_FILENAME)
    }

    pub fn compose_override_path(&self) -> PathBuf {
        self.env_dir.join(COMPOSE_OVERRIDE_FILENAME)
    }

    /// Per-environment persistent volume directory.
    pub fn env_data_dir(&self) -> PathBuf {
        self.data_root.join(self.env.as_str())
    }

    /// Per-environment dump artifact directory.
    pub fn env_backup_dir(&self) -> PathBuf {
        self.backup_root.join(self.env.as_str())
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext {
            env: self.env.as_str().to_string(),
            domain: self.domain.clone(),
            email: self.email.clone(),
            network_name: self.network_name(),
            stack_root: self.stack_root.display().to_string(),
            data_root: self.data_root.display().to_string(),
            backup_root: self.backup_root.display().to_string(),
        }
    }

    /// Fills empty domain/email from the environment's `.env` file.
    ///
    /// A missing `.env` is an error: later rendering steps need *some* value.
    pub fn hydrate_from_dotenv(&mut self) -> Result<()> {
        let vars = dotenv::read_vars(&self.dotenv_path())?;
        if self.domain.is_empty() {
            self.domain = vars.get(DOMAIN_KEY).cloned().unwrap_or_default();
        }
        if self.email.is_empty() {
            self.email = vars.get(EMAIL_KEY).cloned().unwrap_or_default();
        }
        debug!(
            "Hydrated {} from .env: domain='{}', email='{}'",
            self.env, self.domain, self.email
        );
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn test_settings(root: &Path) -> Settings {
        Settings {
            stack_root: root.join("stack"),
            data_root: root.join("data"),
            backup_root: root.join("backups"),
            templates_dir: root.join("templates"),
            systemd_unit_dir: root.join("units"),
        }
    }

    #[test]
    fn test_parse_environment_trims_and_validates() {
        assert_eq!(Environment::parse(" prod \n").unwrap(), Environment::Prod);
        assert_eq!(Environment::parse("qa").unwrap(), Environment::Qa);

        let err = Environment::parse("staging").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("dev, qa, prod"));
        assert!(text.contains("staging"));
    }

    #[test]
    fn test_resolve_derives_paths() {
        let temp = tempdir().unwrap();
        let settings = test_settings(temp.path());
        let cfg = EnvConfig::resolve("dev", &settings).unwrap();

        assert_eq!(cfg.env_dir, temp.path().join("stack").join("dev"));
        assert_eq!(cfg.env_data_dir(), temp.path().join("data").join("dev"));
        assert_eq!(cfg.env_backup_dir(), temp.path().join("backups").join("dev"));
        assert_eq!(cfg.manifest_path(), cfg.env_dir.join("enabled.yml"));
        assert_eq!(cfg.network_name(), "dev_net");
        assert!(cfg.domain.is_empty());
    }

    #[test]
    fn test_resolve_settings_precedence() {
        let file = SettingsFile {
            stack_root: Some("/opt/stack".into()),
            data_root: Some("/opt/data".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> =
            [(ENV_DATA_ROOT, "/mnt/data"), (ENV_TEMPLATES, "/tpl")].into();
        let settings = resolve_settings(&file, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.stack_root, PathBuf::from("/opt/stack")); // from file
        assert_eq!(settings.data_root, PathBuf::from("/mnt/data")); // env beats file
        assert_eq!(settings.backup_root, PathBuf::from(DEFAULT_BACKUP_ROOT));
        assert_eq!(settings.templates_dir, PathBuf::from("/tpl"));
        assert_eq!(
            settings.systemd_unit_dir,
            PathBuf::from(DEFAULT_SYSTEMD_UNIT_DIR)
        );
    }

    #[test]
    fn test_blank_override_falls_back_to_default() {
        let settings = resolve_settings(&SettingsFile::default(), |k| {
            (k == ENV_STACK_ROOT).then(|| "   ".to_string())
        });
        assert_eq!(settings.stack_root, PathBuf::from(DEFAULT_STACK_ROOT));
    }

    #[test]
    fn test_settings_file_rejects_unknown_fields() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "stack_root = \"/x\"\nbogus = 1\n").unwrap();
        let err = parse_settings_file(&path).unwrap_err();
        assert!(err.to_string().contains("invalid settings file"));
    }

    #[test]
    fn test_hydrate_from_dotenv() {
        let temp = tempdir().unwrap();
        let settings = test_settings(temp.path());
        let mut cfg = EnvConfig::resolve("qa", &settings).unwrap();
        fs::create_dir_all(&cfg.env_dir).unwrap();
        fs::write(
            cfg.dotenv_path(),
            "# core\nDOMAIN=\"qa.example.org\"\nADMIN_EMAIL=ops@example.org\n",
        )
        .unwrap();
        cfg.email = "keep@example.org".into();

        cfg.hydrate_from_dotenv().unwrap();

        assert_eq!(cfg.domain, "qa.example.org");
        assert_eq!(cfg.email, "keep@example.org");
    }

    #[test]
    fn test_hydrate_missing_dotenv_fails() {
        let temp = tempdir().unwrap();
        let settings = test_settings(temp.path());
        let mut cfg = EnvConfig::resolve("prod", &settings).unwrap();
        let err = cfg.hydrate_from_dotenv().unwrap_err();
        assert!(err
            .downcast_ref::<StackError>()
            .is_some_and(|e| matches!(e, StackError::DotEnvMissing { .. })));
    }

    #[test]
    fn test_detect_environments() {
        let temp = tempdir().unwrap();
        let settings = test_settings(temp.path());
        fs::create_dir_all(settings.stack_root.join("prod")).unwrap();
        fs::create_dir_all(settings.stack_root.join("dev")).unwrap();
        assert_eq!(
            detect_environments(&settings),
            vec![Environment::Dev, Environment::Prod]
        );
    }
}
