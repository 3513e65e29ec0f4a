//! # stackctl Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per top-level subcommand. Each defines a `clap` argument
//! struct and an async `handle_*` function that `main.rs` dispatches to.
//!
//! ## Command Groups
//!
//! - Provisioning: `init`, `enable`/`disable` (`toggle`), `apply`
//! - Inspection: `status`, `doctor`, `dash`
//! - Operations: `backup`
//! - Interactive: `setup` (wizard), `modules` (manager), `config` (.env editor)
//!
//! Handlers share `CommandContext`: settings resolved once per process plus
//! the built-in module catalog, passed down explicitly.
//!
pub mod apply;
pub mod backup;
pub mod config;
pub mod dash;
pub mod doctor;
pub mod init;
pub mod modules;
pub mod setup;
pub mod status;
pub mod toggle;

use crate::core::config::{self as settings_config, EnvConfig, Settings};
use crate::core::error::{Result, StackError};
use crate::stack::catalog::Catalog;
use clap::Args;

/// `--env` as a required flag.
#[derive(Args, Debug, Clone)]
pub struct EnvArg {
    /// Target environment: dev, qa or prod.
    #[arg(long, short = 'e', value_name = "ENV")]
    pub env: String,
}

/// `--env` where omitting it means "ask" or "all".
#[derive(Args, Debug, Clone, Default)]
pub struct OptionalEnvArg {
    /// Target environment: dev, qa or prod.
    #[arg(long, short = 'e', value_name = "ENV")]
    pub env: Option<String>,
}

/// Process-wide state every handler needs.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub catalog: Catalog,
}

impl CommandContext {
    pub fn load() -> Result<Self> {
        Ok(Self {
            settings: settings_config::load_settings()?,
            catalog: Catalog::builtin(),
        })
    }

    /// Validates the environment name and derives its paths.
    pub fn env(&self, name: &str) -> Result<EnvConfig> {
        EnvConfig::resolve(name, &self.settings)
    }

    /// Like `env`, with domain/email filled from the environment's `.env`.
    pub fn hydrated_env(&self, name: &str) -> Result<EnvConfig> {
        let mut cfg = self.env(name)?;
        cfg.hydrate_from_dotenv()?;
        Ok(cfg)
    }

    /// The named environment, or the first one that exists on disk.
    pub fn env_or_first(&self, requested: Option<&str>) -> Result<EnvConfig> {
        if let Some(name) = requested {
            return self.env(name);
        }
        settings_config::detect_environments(&self.settings)
            .first()
            .map(|env| EnvConfig::for_env(*env, &self.settings))
            .ok_or_else(|| {
                StackError::Config("no environments found; run 'stackctl init' first".to_string()).into()
            })
    }
}
