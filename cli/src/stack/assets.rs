//! # Module Asset Synchronizer
//!
//! File: cli/src/stack/assets.rs
//!
//! Mirrors every `templates/modules/<name>/` tree into `<env dir>/<name>/`,
//! enabled or not, so turning a module on later finds its files in place.
//! Compose overlays are skipped (the assembler consumes them) and existing
//! destination files are never overwritten, which keeps operator edits.
//!
use crate::common::fs::copy::{self, MirrorStats};
use crate::common::fs::io;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use crate::stack::compose::OVERLAY_FILENAME;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Syncs all module assets into the environment. A template tree without a
/// `modules/` directory is not an error.
pub fn sync_module_assets(cfg: &EnvConfig, templates_dir: &Path) -> Result<MirrorStats> {
    let modules_dir = templates_dir.join("modules");
    let mut total = MirrorStats::default();
    if !modules_dir.is_dir() {
        debug!("No module templates at {}", modules_dir.display());
        return Ok(total);
    }

    let mut entries: Vec<_> = fs::read_dir(&modules_dir)
        .with_context(|| format!("Failed to list {}", modules_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name();
        io::ensure_dir_exists(&cfg.env_dir.join(&name))?;
        let stats = copy::mirror_tree_no_clobber(&entry.path(), &cfg.env_dir.join(&name), |path| {
            path.file_name().is_some_and(|f| f == OVERLAY_FILENAME)
        })
        .with_context(|| format!("Failed to sync module assets for {}", name.to_string_lossy()))?;
        total.copied += stats.copied;
        total.kept += stats.kept;
        total.excluded += stats.excluded;
    }

    info!(
        "Module assets synced for {}: {} copied, {} kept",
        cfg.env, total.copied, total.kept
    );
    Ok(total)
}
