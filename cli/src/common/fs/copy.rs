//! # stackctl Filesystem Copy Operations
//!
//! File: cli/src/common/fs/copy.rs
//!
//! ## Overview
//!
//! Copies that never clobber. Files staged into an environment directory may
//! be customised by the operator afterwards, so a copy whose destination
//! already exists is skipped rather than overwritten.
//!
//! ## Architecture
//!
//! - `copy_file_no_clobber` wraps `fs_extra::file::copy` with `skip_exist`.
//! - `mirror_tree_no_clobber` walks a source tree with `walkdir`, recreates
//!   its directories under the target, and copies each file through
//!   `copy_file_no_clobber`. A caller-supplied predicate can exclude files.
//!
use crate::common::fs::io;
use crate::core::error::Result;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Outcome counters for a tree mirror.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorStats {
    pub copied: usize,
    pub kept: usize,
    pub excluded: usize,
}

/// Copies `source` to `target` unless `target` already exists.
///
/// Returns `true` when a copy happened.
pub fn copy_file_no_clobber(source: &Path, target: &Path) -> Result<bool> {
    if target.exists() {
        debug!("Keeping existing {:?}", target);
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        io::ensure_dir_exists(parent)?;
    }

    let mut options = fs_extra::file::CopyOptions::new();
    options.overwrite = false;
    options.skip_exist = true;

    fs_extra::file::copy(source, target, &options).map_err(|e| {
        anyhow::anyhow!(e).context(format!("Failed to copy {:?} to {:?}", source, target))
    })?;
    debug!("Copied {:?} -> {:?}", source, target);
    Ok(true)
}

/// Mirrors the tree under `source` into `target` without overwriting files.
///
/// Files for which `exclude` returns `true` are neither copied nor counted as kept.
pub fn mirror_tree_no_clobber<F>(source: &Path, target: &Path, exclude: F) -> Result<MirrorStats>
where
    F: Fn(&Path) -> bool,
{
    let mut stats = MirrorStats::default();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            anyhow::anyhow!(e).context(format!("Failed to walk {:?}", source))
        })?;
        let relative = entry.path().strip_prefix(source)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            io::ensure_dir_exists(&dest)?;
        } else if exclude(entry.path()) {
            stats.excluded += 1;
        } else if copy_file_no_clobber(entry.path(), &dest)? {
            stats.copied += 1;
        } else {
            stats.kept += 1;
        }
    }
    Ok(stats)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_copy_file_no_clobber_keeps_existing() -> Result<()> {
        let temp = tempdir()?;
        let src = temp.path().join("src.yml");
        let dst = temp.path().join("out/dst.yml");
        fs::write(&src, "from template")?;

        assert!(copy_file_no_clobber(&src, &dst)?);
        assert_eq!(fs::read_to_string(&dst)?, "from template");

        fs::write(&dst, "operator edit")?;
        fs::write(&src, "template changed")?;
        assert!(!copy_file_no_clobber(&src, &dst)?);
        assert_eq!(fs::read_to_string(&dst)?, "operator edit");
        Ok(())
    }

    #[test]
    fn test_mirror_tree_excludes_and_counts() -> Result<()> {
        let source = tempdir()?;
        let target = tempdir()?;
        fs::create_dir_all(source.path().join("rules"))?;
        fs::write(source.path().join("compose.yml"), "services: {}")?;
        fs::write(source.path().join("prometheus.yml"), "scrape_configs: []")?;
        fs::write(source.path().join("rules/alerts.yml"), "groups: []")?;
        fs::create_dir_all(source.path().join("empty"))?;

        let stats = mirror_tree_no_clobber(source.path(), target.path(), |p| {
            p.file_name().is_some_and(|n| n == "compose.yml")
        })?;

        assert_eq!(stats.copied, 2);
        assert_eq!(stats.excluded, 1);
        assert!(target.path().join("rules/alerts.yml").is_file());
        assert!(target.path().join("empty").is_dir());
        assert!(!target.path().join("compose.yml").exists());

        let again = mirror_tree_no_clobber(source.path(), target.path(), |_| false)?;
        assert_eq!(again.kept, 2);
        assert_eq!(again.copied, 1); // compose.yml no longer excluded
        Ok(())
    }
}
