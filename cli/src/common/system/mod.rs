//! # stackctl System Utilities Module (`common::system`)
//!
//! File: cli/src/common/system/mod.rs
//!
//! ## Overview
//!
//! Host inspection used by `doctor`, the setup wizard's preflight step and
//! the systemd installer:
//!
//! - **`find_tool`**: PATH lookup through the `which` crate.
//! - **`is_root`**: Effective UID check via `id -u`.
//! - **`check_writable`**: Creates the directory if needed, then creates and
//!   drops a temporary file inside it.
//! - **`free_space_gib`**: Available space on the filesystem holding a path,
//!   read from `df -Pk` (POSIX output format).
//! - **`platform`**: `os/arch` of the running binary.
//!
use crate::common::fs::io;
use crate::common::process;
use crate::core::error::{Result, StackError};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Minimum free space `doctor` expects under the stack root.
pub const MIN_FREE_GIB: u64 = 5;

pub fn find_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|e| anyhow!("{} not found in PATH: {}", name, e))
}

pub fn platform() -> String {
    format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// `true` when running with UID 0. Any failure to ask counts as not root.
pub async fn is_root() -> bool {
    match process::run_capture("id", &["-u".to_string()]).await {
        Ok(out) => out.trim() == "0",
        Err(e) => {
            debug!("Could not determine effective uid: {:#}", e);
            false
        }
    }
}

pub fn check_writable(dir: &Path) -> Result<()> {
    io::ensure_dir_exists(dir)?;
    let probe = tempfile::Builder::new()
        .prefix("stackctl-write-check-")
        .tempfile_in(dir)
        .with_context(|| format!("{} is not writable", dir.display()))?;
    drop(probe);
    Ok(())
}

/// Parses the available-KiB column from `df -Pk` output.
pub fn parse_df_available_kib(df_output: &str) -> Result<u64> {
    let line = df_output
        .lines()
        .nth(1)
        .ok_or_else(|| anyhow!("unexpected df output: {:?}", df_output))?;
    let available = line
        .split_whitespace()
        .nth(3)
        .ok_or_else(|| anyhow!("unexpected df line: {:?}", line))?;
    available
        .parse()
        .with_context(|| format!("invalid available size {:?}", available))
}

/// Free space in whole GiB on the filesystem holding `path`.
///
/// `path` need not exist yet; its nearest existing ancestor is measured.
pub async fn free_space_gib(path: &Path) -> Result<u64> {
    let existing = path
        .ancestors()
        .find(|p| p.exists())
        .ok_or_else(|| StackError::FileSystem(format!("no existing ancestor of {}", path.display())))?;
    let out = process::run_capture("df", &["-Pk".to_string(), existing.display().to_string()]).await?;
    Ok(parse_df_available_kib(&out)? / (1024 * 1024))
}
