//! # stackctl Docker Module Interface
//!
//! File: cli/src/common/docker/mod.rs
//!
//! ## Overview
//!
//! stackctl never talks to the Docker API directly. Everything goes through
//! the `docker compose` CLI so the generated files on disk stay the single
//! description of what runs.
//!
//! - **`compose`**: `ComposeProject`, the per-environment argument prefix and
//!   the subcommands built on it, plus parsing of `ps --format json`.
//!
//! ```rust
//! use crate::common::docker::ComposeProject;
//!
//! let project = ComposeProject::for_env(&cfg);
//! if project.service_running("postgres").await { /* ... */ }
//! ```
//!

/// Per-environment `docker compose` invocations.
pub mod compose;

pub use compose::{ComposeProject, ContainerState, DOCKER_BIN};
