//! # stackctl Setup Wizard
//!
//! File: cli/src/commands/setup/mod.rs
//!
//! ## Overview
//!
//! `stackctl setup` walks an operator through provisioning one environment:
//! pick the environment, domain, email and modules, confirm, run the doctor
//! checks, then init, save the modules and apply.
//!
//! ## Architecture
//!
//! - `wizard`: the state machine (`Wizard`, `Step`, `Event`). Pure and unit
//!   tested.
//! - this module: one `inquire` prompt per step. Esc maps to `Event::Back`,
//!   Ctrl-C to `Event::Cancel`. Rejected input is printed and the same step
//!   is prompted again.
//!
//! Progress runs the same functions as `init` and `apply`, so a wizard run
//! and the equivalent command sequence leave identical files behind.
//!
pub mod wizard;

use crate::commands::apply::run_apply;
use crate::commands::doctor::run_checks;
use crate::commands::init::run_init;
use crate::commands::modules::resolve_selection;
use crate::commands::status::modules_line;
use crate::commands::CommandContext;
use crate::common::ui::prompts::{self, Answer};
use crate::core::config::{EnvConfig, Environment};
use crate::core::error::{Result, StackError};
use crate::stack::enabled;
use clap::Parser;
use std::fmt;
use tracing::{debug, info, warn};
use wizard::{Answers, Event, Step, Wizard};

#[derive(Parser, Debug)]
#[command(about = "Interactive first-time setup for an environment")]
pub struct SetupArgs {}

/// Maps a prompt answer onto a wizard event.
fn answer_to_event<T>(answer: Answer<T>, on_value: impl FnOnce(T) -> Event) -> Event {
    match answer {
        Answer::Value(value) => on_value(value),
        Answer::Back => Event::Back,
        Answer::Cancel => Event::Cancel,
    }
}

struct ModuleChoice {
    name: String,
    label: String,
}

impl fmt::Display for ModuleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn prompt_modules(ctx: &CommandContext, answers: &Answers) -> Result<Event> {
    let mut choices = Vec::new();
    for (category, modules) in ctx.catalog.by_category() {
        for module in modules {
            choices.push(ModuleChoice {
                name: module.name.clone(),
                label: format!("{:<14} {:<14} {}", category, module.name, module.description),
            });
        }
    }
    let selected: Vec<usize> = choices
        .iter()
        .enumerate()
        .filter(|(_, c)| answers.modules.contains(&c.name))
        .map(|(i, _)| i)
        .collect();
    let answer = prompts::multi_select("Modules to enable:", choices, &selected)?;
    Ok(answer_to_event(answer, |picked| {
        let names: Vec<String> = picked.into_iter().map(|c| c.name).collect();
        let (closed, notes) = resolve_selection(&ctx.catalog, &names);
        for (dep, required_by) in notes {
            println!("auto-enabled {} (required by {})", dep, required_by);
        }
        Event::SubmitModules(closed.iter().map(str::to_string).collect())
    }))
}

fn print_summary(answers: &Answers) {
    let env = answers.env.map(|e| e.to_string()).unwrap_or_default();
    println!("  Environment: {}", env);
    println!("  Domain:      {}", answers.domain);
    println!("  Email:       {}", answers.email);
    println!("  Modules:     {}", modules_line(&answers.modules));
}

async fn preflight(ctx: &CommandContext) -> Result<Event> {
    println!("Pre-flight checks");
    let results = run_checks(&ctx.settings).await;
    for result in &results {
        println!("  {}", result.line());
    }
    if results.iter().all(|r| r.passed()) {
        return Ok(Event::ChecksPassed);
    }
    let answer = prompts::confirm("Some checks have warnings. Continue anyway?", false)?;
    Ok(match answer {
        Answer::Value(true) => Event::ContinueDespiteWarnings,
        Answer::Value(false) | Answer::Cancel => Event::Cancel,
        Answer::Back => Event::Back,
    })
}

/// Init, save the dependency-closed module set, apply.
async fn provision(ctx: &CommandContext, answers: &Answers) -> Result<EnvConfig> {
    let env = answers
        .env
        .ok_or_else(|| StackError::Config("no environment selected".to_string()))?;
    let mut cfg = EnvConfig::for_env(env, &ctx.settings);

    println!("[1/3] Initializing environment");
    run_init(ctx, &mut cfg, Some(&answers.domain), Some(&answers.email)).await?;

    println!("[2/3] Enabling modules");
    if !answers.modules.is_empty() {
        let (set, _) = resolve_selection(&ctx.catalog, &answers.modules);
        enabled::save(&cfg, &set)?;
    }

    println!("[3/3] Applying configuration");
    let modules = run_apply(ctx, &cfg, false).await?;
    debug!("wizard applied {} with {:?}", cfg.env, modules);
    Ok(cfg)
}

fn print_complete(cfg: &EnvConfig, answers: &Answers) {
    println!("Setup complete!");
    println!("  Environment: {}", cfg.env);
    println!("  Path:        {}", cfg.env_dir.display());
    println!("  Domain:      {}", answers.domain);
    println!("  Modules:     {}", modules_line(&answers.modules));
    println!();
    println!("Next steps");
    println!("  $ stackctl status --env {}", cfg.env);
    println!("  $ stackctl enable <module> --env {}", cfg.env);
    println!("  $ stackctl apply --env {}", cfg.env);
    println!("  $ stackctl doctor");
}

pub async fn handle_setup(_args: SetupArgs) -> Result<()> {
    info!("Handling setup command...");
    let ctx = CommandContext::load()?;
    let mut wizard = Wizard::new();
    let mut provisioned: Option<EnvConfig> = None;

    while !wizard.step().is_terminal() {
        let step = wizard.step();
        if let Some((n, total)) = step.position() {
            println!("Step {} of {}", n, total);
        }
        let event = match step {
            Step::Welcome => {
                println!("stackctl setup: provision a dev, qa or prod environment.");
                answer_to_event(prompts::confirm("Start?", true)?, |go| {
                    if go {
                        Event::Start
                    } else {
                        Event::Cancel
                    }
                })
            }
            Step::EnvSelect => {
                let start = wizard
                    .answers()
                    .env
                    .and_then(|e| Environment::ALL.iter().position(|x| *x == e))
                    .unwrap_or(0);
                answer_to_event(
                    prompts::select("Environment:", Environment::ALL.to_vec(), start)?,
                    Event::ChooseEnv,
                )
            }
            Step::DomainInput => answer_to_event(
                prompts::text(
                    "Domain:",
                    &wizard.answers().domain,
                    "Base domain for this environment (empty for example.com)",
                )?,
                Event::SubmitDomain,
            ),
            Step::EmailInput => answer_to_event(
                prompts::text(
                    "Admin email:",
                    &wizard.answers().email,
                    "Used for certificates and alerts (empty for admin@example.com)",
                )?,
                Event::SubmitEmail,
            ),
            Step::ModuleSelect => prompt_modules(&ctx, wizard.answers())?,
            Step::Confirm => {
                print_summary(wizard.answers());
                answer_to_event(prompts::confirm("Proceed?", true)?, |ok| {
                    if ok {
                        Event::Confirm
                    } else {
                        Event::Back
                    }
                })
            }
            Step::Preflight => preflight(&ctx).await?,
            Step::Progress => {
                provisioned = Some(provision(&ctx, wizard.answers()).await?);
                Event::Provisioned
            }
            Step::Complete => {
                if let Some(cfg) = &provisioned {
                    print_complete(cfg, wizard.answers());
                }
                let options = vec!["Exit", "Set up another environment"];
                answer_to_event(prompts::select("What next?", options, 0)?, |choice| {
                    if choice == "Exit" {
                        Event::Exit
                    } else {
                        Event::SetupAnother
                    }
                })
            }
            Step::Done | Step::Aborted => break,
        };

        if let Err(e) = wizard.handle(event) {
            warn!("{}", e);
            println!("{}", e);
        }
    }

    if wizard.step() == Step::Aborted {
        println!("setup cancelled");
    }
    Ok(())
}
