//! # stackctl Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces used by the composition engine (`stack`) and the
//! command handlers:
//! - `config`: Settings resolution and the per-environment `EnvConfig`
//! - `dotenv`: Line-preserving reads and rewrites of `.env` files
//! - `error`: The `StackError` taxonomy and `Result` alias
//! - `templating`: Strict template rendering against a `RenderContext`
//!
//! ```rust
//! use crate::core::config::{self, EnvConfig};
//! use crate::core::error::{Result, StackError};
//! use crate::core::templating;
//! ```
//!
pub mod config;
pub mod dotenv;
pub mod error;
pub mod templating;
