//! # stackctl Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the generators and command handlers.
//!
//! - **`copy`**: No-clobber file copies and tree mirroring (`fs_extra` + `walkdir`). Used by the module asset synchronizer.
//! - **`io`**: Directory creation, reads, mode-aware writes, atomic replacement and idempotent removal.
//!
//! Callers import from the specific submodule, e.g. `crate::common::fs::io::ensure_dir_exists`.
//!

/// No-clobber copies (`copy_file_no_clobber`, `mirror_tree_no_clobber`).
pub mod copy;
/// Basic file I/O (`ensure_dir_exists`, `write_string_to_file_with_mode`, `replace_file_atomic`, ...).
pub mod io;
