//! # stackctl UI Utilities Module (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//!
//! ## Overview
//!
//! Terminal presentation shared by the interactive entry points:
//!
//! - **`tables`**: `comfy-table` builders for module and environment listings.
//! - **`prompts`**: `inquire` prompts whose outcomes distinguish a value,
//!   "go back" (Esc) and "cancel" (Ctrl-C), which the setup wizard's state
//!   machine consumes directly.
//!

/// Interactive prompts (`inquire`).
pub mod prompts;
/// Table rendering (`comfy-table`).
pub mod tables;
