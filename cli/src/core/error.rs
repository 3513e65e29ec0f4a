//! # stackctl Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error taxonomy shared by every component of
//! stackctl. Component functions return `Result<T>` (an `anyhow::Result`)
//! and raise `StackError` values for the failures a caller might want to
//! recognise; everything else travels as context-wrapped `anyhow` errors.
//!
//! ## Architecture
//!
//! The variants group into the four classes the command drivers care about:
//! - Validation: `InvalidEnvironment`, `UnknownModule`, `Config`
//! - Templates and documents: `Template`, `ComposeParse`, `ComposeShape`,
//!   `ManifestMissing`, `ManifestParse`, `DotEnvMissing`
//! - Filesystem: `FileSystem`
//! - Subprocesses: `ExternalCommand`
//!
//! Best-effort steps (privileged systemd install) never construct these;
//! they log a warning and carry on.
//!
//! ## Examples
//!
//! ```rust
//! if !path.exists() {
//!     anyhow::bail!(StackError::DotEnvMissing { path: path.to_path_buf() });
//! }
//!
//! match result {
//!     Err(e) if e.downcast_ref::<StackError>().is_some_and(|se| matches!(se, StackError::UnknownModule { .. })) => {
//!         eprintln!("pick a module from the catalog");
//!     }
//!     other => other?,
//! }
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for stackctl.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("--env must be one of: {allowed} (got '{given}')")]
    InvalidEnvironment { given: String, allowed: String },

    #[error("unknown module: {name}")]
    UnknownModule { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("enabled-modules manifest not found at {}; run 'stackctl init' first", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("failed to parse enabled-modules manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error(".env file not found at {}; run 'stackctl init' first", path.display())]
    DotEnvMissing { path: PathBuf },

    #[error("Template rendering error in '{template}': {message}")]
    Template { template: String, message: String },

    #[error("failed to parse compose document '{source_name}': {message}")]
    ComposeParse { source_name: String, message: String },

    #[error("unexpected shape in compose document '{source_name}': {message}")]
    ComposeShape { source_name: String, message: String },

    #[error("External command failed: {cmd}, Status: {status}, Output:\n{output}")]
    ExternalCommand {
        cmd: String,
        status: String,
        output: String,
    },
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
