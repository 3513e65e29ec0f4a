//! # Interactive Prompts
//!
//! File: cli/src/common/ui/prompts.rs
//!
//! Wraps `inquire` so callers get an `Answer` instead of an error for the
//! two ways an operator leaves a prompt: Esc means `Back`, Ctrl-C means
//! `Cancel`. Any other prompt failure (no TTY, I/O error) is still an error.
//!
use crate::core::error::Result;
use anyhow::anyhow;
use inquire::{Confirm, InquireError, MultiSelect, Select, Text};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    Value(T),
    Back,
    Cancel,
}

/// Maps an `inquire` result onto an `Answer`.
pub fn classify<T>(result: std::result::Result<T, InquireError>) -> Result<Answer<T>> {
    match result {
        Ok(value) => Ok(Answer::Value(value)),
        Err(InquireError::OperationCanceled) => Ok(Answer::Back),
        Err(InquireError::OperationInterrupted) => Ok(Answer::Cancel),
        Err(e) => Err(anyhow!(e).context("Interactive prompt failed")),
    }
}

pub fn text(message: &str, default: &str, help: &str) -> Result<Answer<String>> {
    classify(
        Text::new(message)
            .with_default(default)
            .with_help_message(help)
            .prompt(),
    )
}

pub fn select<T: Display>(message: &str, options: Vec<T>, start: usize) -> Result<Answer<T>> {
    classify(
        Select::new(message, options)
            .with_starting_cursor(start)
            .with_help_message("↑↓ to move, enter to select, esc to go back, ctrl-c to quit")
            .prompt(),
    )
}

pub fn multi_select<T: Display>(message: &str, options: Vec<T>, selected: &[usize]) -> Result<Answer<Vec<T>>> {
    classify(
        MultiSelect::new(message, options)
            .with_default(selected)
            .with_help_message("space to toggle, enter to confirm, esc to go back, ctrl-c to quit")
            .prompt(),
    )
}

pub fn confirm(message: &str, default: bool) -> Result<Answer<bool>> {
    classify(Confirm::new(message).with_default(default).prompt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_maps_escape_and_interrupt() -> Result<()> {
        assert_eq!(classify(Ok::<_, InquireError>(3))?, Answer::Value(3));
        assert_eq!(classify::<u8>(Err(InquireError::OperationCanceled))?, Answer::Back);
        assert_eq!(classify::<u8>(Err(InquireError::OperationInterrupted))?, Answer::Cancel);
        assert!(classify::<u8>(Err(InquireError::NotTTY)).is_err());
        Ok(())
    }
}
