//! # Enabled-Modules Store
//!
//! File: cli/src/stack/enabled.rs
//!
//! ## Overview
//!
//! Each environment persists the modules an operator turned on in
//! `<env dir>/enabled.yml`:
//!
//! ```yaml
//! modules:
//!   - dozzle
//!   - grafana
//! ```
//!
//! The raw set is what `enable`/`disable` edit. Everything else consumes the
//! *effective* list from `effective_modules`: the raw set intersected with
//! the catalog, closed over dependencies, deduplicated and sorted. That list
//! is the single source of truth for compose assembly, nginx fragments,
//! status output and `--profile` selection.
//!
//! Unknown names are dropped from the effective list with a warning but kept
//! in the manifest, so a newer catalog can still read them.
//!
use crate::common::fs::io;
use crate::core::config::EnvConfig;
use crate::core::error::{Result, StackError};
use crate::stack::catalog::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// On-disk shape of `enabled.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    modules: Option<Vec<String>>,
}

/// The operator's chosen modules, as persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledSet {
    names: BTreeSet<String>,
}

impl EnabledSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns `false` when the module was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    /// Returns `false` when the module was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reads the manifest at `path`.
///
/// A missing file is `StackError::ManifestMissing`; malformed YAML is
/// `StackError::ManifestParse` naming the file.
pub fn load_from(path: &Path) -> Result<EnabledSet> {
    if !path.exists() {
        anyhow::bail!(StackError::ManifestMissing {
            path: path.to_path_buf()
        });
    }
    let content = io::read_file_to_string(path)?;
    if content.trim().is_empty() {
        debug!("{} is empty, treating as no modules", path.display());
        return Ok(EnabledSet::default());
    }
    let manifest: Manifest =
        serde_yaml::from_str(&content).map_err(|e| StackError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(EnabledSet::from_names(manifest.modules.unwrap_or_default()))
}

/// Writes `set` to `path` as a sorted list, replacing the file atomically.
pub fn save_to(path: &Path, set: &EnabledSet) -> Result<()> {
    let manifest = Manifest {
        modules: Some(set.iter().map(str::to_string).collect()),
    };
    let yaml = serde_yaml::to_string(&manifest)
        .map_err(|e| anyhow::anyhow!(e).context("Failed to serialize enabled-modules manifest"))?;
    io::replace_file_atomic(path, &yaml, io::FILE_MODE)?;
    debug!("Saved {} module(s) to {}", set.len(), path.display());
    Ok(())
}

pub fn load(cfg: &EnvConfig) -> Result<EnabledSet> {
    load_from(&cfg.manifest_path())
}

pub fn save(cfg: &EnvConfig, set: &EnabledSet) -> Result<()> {
    save_to(&cfg.manifest_path(), set)
}

/// Creates an empty manifest unless one already exists. Returns whether it wrote.
pub fn ensure_default(cfg: &EnvConfig) -> Result<bool> {
    let path = cfg.manifest_path();
    if path.exists() {
        return Ok(false);
    }
    save_to(&path, &EnabledSet::default())?;
    info!("Created empty module manifest at {}", path.display());
    Ok(true)
}

/// Projects a raw set onto the catalog: filter, dependency closure, sort.
pub fn resolve_effective(set: &EnabledSet, catalog: &Catalog) -> Vec<String> {
    for unknown in set.iter().filter(|n| !catalog.contains(n)) {
        warn!("Ignoring unknown module '{}' in manifest", unknown);
    }
    catalog
        .close_over_dependencies(set.iter())
        .into_iter()
        .collect()
}

/// Loads the environment's manifest and returns its effective module list.
pub fn effective_modules(cfg: &EnvConfig, catalog: &Catalog) -> Result<Vec<String>> {
    let set = load(cfg)?;
    Ok(resolve_effective(&set, catalog))
}

/// Result of an enable/disable request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Enabled,
    AlreadyEnabled,
    Disabled,
    AlreadyDisabled,
}

impl Toggle {
    pub fn changed(self) -> bool {
        matches!(self, Toggle::Enabled | Toggle::Disabled)
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Toggle::Enabled => "enabled",
            Toggle::AlreadyEnabled => "already enabled",
            Toggle::Disabled => "disabled",
            Toggle::AlreadyDisabled => "already disabled",
        };
        f.write_str(label)
    }
}

/// Turns `module` on or off in the environment's manifest.
///
/// The module name is validated against the catalog before anything is read
/// or written. The manifest is only rewritten when the set changes.
pub fn set_module(cfg: &EnvConfig, catalog: &Catalog, module: &str, enable: bool) -> Result<Toggle> {
    catalog.require(module)?;
    let mut set = load(cfg)?;
    let outcome = match (enable, enable && set.insert(module) || !enable && set.remove(module)) {
        (true, true) => Toggle::Enabled,
        (true, false) => Toggle::AlreadyEnabled,
        (false, true) => Toggle::Disabled,
        (false, false) => Toggle::AlreadyDisabled,
    };
    if outcome.changed() {
        save(cfg, &set)?;
    }
    info!("{} {} for {}", module, outcome, cfg.env);
    Ok(outcome)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Environment, Settings};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn env_config(temp: &TempDir) -> EnvConfig {
        let root = temp.path();
        let settings = Settings {
            stack_root: root.join("stack"),
            data_root: root.join("data"),
            backup_root: root.join("backups"),
            templates_dir: root.join("templates"),
            systemd_unit_dir: root.join("units"),
        };
        let cfg = EnvConfig::for_env(Environment::Dev, &settings);
        fs::create_dir_all(&cfg.env_dir).unwrap();
        cfg
    }

    #[test]
    fn test_load_missing_manifest_is_error() {
        let temp = tempdir().unwrap();
        let cfg = env_config(&temp);
        let err = load(&cfg).unwrap_err();
        assert!(err
            .downcast_ref::<StackError>()
            .is_some_and(|e| matches!(e, StackError::ManifestMissing { .. })));
    }

    #[test]
    fn test_malformed_manifest_names_file() {
        let temp = tempdir().unwrap();
        let cfg = env_config(&temp);
        fs::write(cfg.manifest_path(), "modules: {not: [a list").unwrap();
        let err = load(&cfg).unwrap_err();
        assert!(err.to_string().contains("enabled.yml"));
    }

    #[test]
    fn test_save_sorts_and_load_round_trips() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        let set = EnabledSet::from_names(["loki", "grafana", "dozzle"]);
        save(&cfg, &set)?;

        let text = fs::read_to_string(cfg.manifest_path())?;
        assert_eq!(text, "modules:\n- dozzle\n- grafana\n- loki\n");
        assert_eq!(load(&cfg)?, set);
        Ok(())
    }

    #[test]
    fn test_effective_modules_adds_dependencies() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        fs::write(cfg.manifest_path(), "modules:\n  - dozzle\n")?;
        let catalog = Catalog::builtin();

        let first = effective_modules(&cfg, &catalog)?;
        assert_eq!(first, vec!["dozzle", "socket-proxy"]);
        assert_eq!(effective_modules(&cfg, &catalog)?, first);
        Ok(())
    }

    #[test]
    fn test_effective_modules_drops_unknown_and_dedups() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        fs::write(
            cfg.manifest_path(),
            "modules: [socket-proxy, zzz-future, dozzle, socket-proxy]\n",
        )?;
        assert_eq!(
            effective_modules(&cfg, &Catalog::builtin())?,
            vec!["dozzle", "socket-proxy"]
        );
        Ok(())
    }

    #[test]
    fn test_empty_manifest_yields_empty_list() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        fs::write(cfg.manifest_path(), "modules: []\n")?;
        assert!(effective_modules(&cfg, &Catalog::builtin())?.is_empty());
        fs::write(cfg.manifest_path(), "")?;
        assert!(effective_modules(&cfg, &Catalog::builtin())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_ensure_default_does_not_overwrite() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        assert!(ensure_default(&cfg)?);
        save(&cfg, &EnabledSet::from_names(["kuma"]))?;
        assert!(!ensure_default(&cfg)?);
        assert!(load(&cfg)?.contains("kuma"));
        Ok(())
    }

    #[test]
    fn test_set_module_toggles() -> Result<()> {
        let temp = tempdir()?;
        let cfg = env_config(&temp);
        let catalog = Catalog::builtin();
        ensure_default(&cfg)?;

        assert_eq!(set_module(&cfg, &catalog, "grafana", true)?, Toggle::Enabled);
        assert_eq!(
            set_module(&cfg, &catalog, "grafana", true)?,
            Toggle::AlreadyEnabled
        );
        assert_eq!(set_module(&cfg, &catalog, "grafana", false)?, Toggle::Disabled);
        assert_eq!(
            set_module(&cfg, &catalog, "loki", false)?,
            Toggle::AlreadyDisabled
        );
        assert_eq!(Toggle::AlreadyDisabled.to_string(), "already disabled");
        Ok(())
    }

    #[test]
    fn test_set_unknown_module_writes_nothing() {
        let temp = tempdir().unwrap();
        let cfg = env_config(&temp);
        let err = set_module(&cfg, &Catalog::builtin(), "nope", true).unwrap_err();
        assert!(err.to_string().contains("unknown module: nope"));
        assert!(!cfg.manifest_path().exists());
    }
}
