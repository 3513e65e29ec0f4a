//! # stackctl Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Cross-cutting helpers shared by the composition engine (`stack`) and the
//! command handlers (`commands`). Nothing here knows about modules or
//! templates; it wraps the host: files, processes, docker compose, ports,
//! and the terminal.
//!
//! - **`archive`**: Streaming gzip of command output (backup dumps).
//! - **`docker`**: `ComposeProject`, the per-environment `docker compose` wrapper.
//! - **`fs`**: Directory creation, mode-aware and atomic writes, no-clobber copies.
//! - **`network`**: Listening-port checks.
//! - **`process`**: Async subprocess execution (captured, streamed, piped).
//! - **`system`**: Tool lookup, root detection, disk space and writability probes.
//! - **`ui`**: Tables and interactive prompts.
//!

/// Streaming compression for backup artifacts.
pub mod archive;
/// `docker compose` invocations per environment.
pub mod docker;
/// Filesystem operations (I/O, no-clobber copies).
pub mod fs;
/// Port checks.
pub mod network;
/// External process execution.
pub mod process;
/// Host inspection (tools, privileges, disk, writability).
pub mod system;
/// Terminal tables and prompts.
pub mod ui;
