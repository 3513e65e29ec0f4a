//! # stackctl Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes the small filesystem primitives every generator in
//! stackctl relies on: creating directories, reading files, writing rendered
//! output with an explicit permission mode, replacing a file via a temporary
//! sibling, and removing files idempotently.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: `mkdir -p` semantics; fails if the path exists but is not a directory.
//! - **`read_file_to_string`**: `fs::read_to_string` with path context.
//! - **`write_string_to_file_with_mode`**: Creates parent directories, writes, then applies the Unix mode.
//! - **`replace_file_atomic`**: Writes into a temp file in the target directory and renames it over the target.
//! - **`remove_file_if_exists`**: Deletes a file; a missing file is not an error.
//!
use crate::core::error::{Result, StackError};
use anyhow::Context;
use std::fs;
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, info};

/// Default mode for generated environment files.
pub const FILE_MODE: u32 = 0o640;
/// Default mode for generated directories.
pub const DIR_MODE: u32 = 0o750;

/// Ensures that a directory exists at the specified path.
///
/// Newly created directories receive `DIR_MODE`; existing ones are left alone.
///
/// # Errors
///
/// Returns an `Err` if the path exists but is not a directory, or creation fails.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        fs::set_permissions(path, fs::Permissions::from_mode(DIR_MODE))
            .with_context(|| format!("Failed to set permissions on {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(StackError::FileSystem(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Reads the entire content of a file into a string.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Writes `content` to `path` with the given Unix permission bits.
///
/// Parent directories are created as needed and an existing file is replaced.
pub fn write_string_to_file_with_mode(path: &Path, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write to file {:?}", path))?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {:?}", path))?;
    debug!("Wrote {} bytes to {:?} (mode {:o})", content.len(), path, mode);
    Ok(())
}

/// Replaces `path` by writing a temporary sibling and renaming it into place.
///
/// Readers never observe a half-written file.
pub fn replace_file_atomic(path: &Path, content: &str, mode: u32) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir_exists(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".stackctl-")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions for {:?}", path))?;
    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to move temporary file over {:?}", path))?;
    debug!("Atomically replaced {:?}", path);
    Ok(())
}

/// Deletes `path` if present. Returns whether a file was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("Removed {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
    }
}
