//! # stackctl Archive Utilities (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! Compression helpers used by `stackctl backup`.
//!

/// Streaming gzip of command output into files.
pub mod compression;
