//! # Setup Wizard State Machine
//!
//! File: cli/src/commands/setup/wizard.rs
//!
//! ## Overview
//!
//! The wizard is a plain finite-state machine with no I/O. The driver in
//! `setup/mod.rs` shows a prompt for the current `Step`, turns the answer
//! into an `Event`, and feeds it to `Wizard::handle`. Invalid input is
//! rejected with a `WizardError` and the step does not change.
//!
//! ```text
//! Welcome -> EnvSelect -> DomainInput -> EmailInput -> ModuleSelect
//!         -> Confirm -> Preflight -> Progress -> Complete -> Done
//! ```
//!
//! `Back` walks one step left through the input screens, `Cancel` goes to
//! `Aborted` from anywhere but `Progress`, and `SetupAnother` on the final
//! screen clears the collected answers and returns to `EnvSelect`.
//!
use crate::commands::init::{DEFAULT_DOMAIN, DEFAULT_EMAIL};
use crate::core::config::Environment;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Welcome,
    EnvSelect,
    DomainInput,
    EmailInput,
    ModuleSelect,
    Confirm,
    Preflight,
    Progress,
    Complete,
    Done,
    Aborted,
}

impl Step {
    /// "Step N of 5" position for the input screens.
    pub fn position(self) -> Option<(usize, usize)> {
        let index = match self {
            Step::EnvSelect => 1,
            Step::DomainInput => 2,
            Step::EmailInput => 3,
            Step::ModuleSelect => 4,
            Step::Confirm => 5,
            _ => return None,
        };
        Some((index, 5))
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Step::Done | Step::Aborted)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start,
    ChooseEnv(Environment),
    SubmitDomain(String),
    SubmitEmail(String),
    SubmitModules(Vec<String>),
    Confirm,
    ChecksPassed,
    ContinueDespiteWarnings,
    Provisioned,
    SetupAnother,
    Exit,
    Back,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("invalid domain format: '{0}'")]
    InvalidDomain(String),
    #[error("invalid email format: '{0}'")]
    InvalidEmail(String),
    #[error("{event:?} is not accepted on the {step} step")]
    Unexpected { step: Step, event: Event },
}

/// Answers collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    pub env: Option<Environment>,
    pub domain: String,
    pub email: String,
    /// Sorted and deduplicated.
    pub modules: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    answers: Answers,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

/// `label.label.tld`: first character alphanumeric, labels of letters, digits
/// and hyphens, at least one dot, alphabetic top-level label of 2+ chars.
pub fn is_valid_domain(domain: &str) -> bool {
    let Some((head, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let starts_alnum = domain.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    starts_alnum
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && head.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// `local@host.tld` with the usual permitted characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, rest)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = rest.rsplit_once('.') else {
        return false;
    };
    !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
        && !host.is_empty()
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Welcome,
            answers: Answers::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    fn previous(step: Step) -> Option<Step> {
        match step {
            Step::EnvSelect => Some(Step::Welcome),
            Step::DomainInput => Some(Step::EnvSelect),
            Step::EmailInput => Some(Step::DomainInput),
            Step::ModuleSelect => Some(Step::EmailInput),
            Step::Confirm => Some(Step::ModuleSelect),
            Step::Preflight => Some(Step::Confirm),
            Step::Welcome | Step::Complete => Some(Step::Aborted),
            _ => None,
        }
    }

    /// Applies `event` and returns the new step.
    pub fn handle(&mut self, event: Event) -> Result<Step, WizardError> {
        let next = match (self.step, event) {
            (step, Event::Cancel) if step != Step::Progress && !step.is_terminal() => Step::Aborted,
            (step, Event::Back) => match Self::previous(step) {
                Some(prev) => prev,
                None => {
                    return Err(WizardError::Unexpected {
                        step,
                        event: Event::Back,
                    })
                }
            },
            (Step::Welcome, Event::Start) => Step::EnvSelect,
            (Step::EnvSelect, Event::ChooseEnv(env)) => {
                self.answers.env = Some(env);
                Step::DomainInput
            }
            (Step::DomainInput, Event::SubmitDomain(raw)) => {
                let value = match raw.trim() {
                    "" => DEFAULT_DOMAIN.to_string(),
                    v => v.to_string(),
                };
                if !is_valid_domain(&value) {
                    return Err(WizardError::InvalidDomain(value));
                }
                self.answers.domain = value;
                Step::EmailInput
            }
            (Step::EmailInput, Event::SubmitEmail(raw)) => {
                let value = match raw.trim() {
                    "" => DEFAULT_EMAIL.to_string(),
                    v => v.to_string(),
                };
                if !is_valid_email(&value) {
                    return Err(WizardError::InvalidEmail(value));
                }
                self.answers.email = value;
                Step::ModuleSelect
            }
            (Step::ModuleSelect, Event::SubmitModules(mut modules)) => {
                modules.sort();
                modules.dedup();
                self.answers.modules = modules;
                Step::Confirm
            }
            (Step::Confirm, Event::Confirm) => Step::Preflight,
            (Step::Preflight, Event::ChecksPassed | Event::ContinueDespiteWarnings) => Step::Progress,
            (Step::Progress, Event::Provisioned) => Step::Complete,
            (Step::Complete, Event::SetupAnother) => {
                self.answers = Answers::default();
                Step::EnvSelect
            }
            (Step::Complete, Event::Exit) => Step::Done,
            (step, event) => return Err(WizardError::Unexpected { step, event }),
        };
        self.step = next;
        Ok(next)
    }
}
