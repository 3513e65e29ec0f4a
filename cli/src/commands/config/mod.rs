//! # stackctl Config Handler
//!
//! File: cli/src/commands/config/mod.rs
//!
//! ## Overview
//!
//! `stackctl config` views and edits an environment's `.env`:
//!
//! - no flags: grouped listing (Core, Databases, Security, Backup, Other),
//!   secrets masked unless `--show-secrets`
//! - `--set KEY=VALUE` / `--generate KEY`: edits applied through the
//!   line-preserving rewrite, then the affected services are reported
//! - `--restart`: restart those services with `docker compose restart`
//! - `--validate`: required keys, placeholders and secret lengths
//! - `--edit`: interactive loop over the same operations
//!
//! Without `--env` the first environment found on disk is used.
//!
pub mod editor;

use crate::commands::{CommandContext, OptionalEnvArg};
use crate::common::docker::ComposeProject;
use crate::common::ui::prompts::{self, Answer};
use crate::common::ui::tables;
use crate::core::config::EnvConfig;
use crate::core::error::Result;
use clap::Parser;
use editor::ConfigSession;
use std::fmt;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(about = "View and edit an environment's .env configuration")]
pub struct ConfigArgs {
    #[command(flatten)]
    pub env: OptionalEnvArg,

    /// Set a value, as KEY=VALUE. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Generate a random password for a secret key. Repeatable.
    #[arg(long = "generate", value_name = "KEY")]
    pub generate: Vec<String>,

    /// Check required keys, placeholder values and password lengths.
    #[arg(long)]
    pub validate: bool,

    /// Print secret values instead of masking them.
    #[arg(long)]
    pub show_secrets: bool,

    /// Restart the services affected by this invocation's changes.
    #[arg(long)]
    pub restart: bool,

    /// Edit interactively.
    #[arg(long)]
    pub edit: bool,
}

fn print_listing(session: &ConfigSession, show_secrets: bool) {
    let vars = session.vars();
    let rows: Vec<Vec<String>> = editor::ordered_keys(&vars)
        .into_iter()
        .map(|(group, key)| {
            let value = editor::display_value(&key, &vars[&key], show_secrets);
            vec![group.to_string(), key, value]
        })
        .collect();
    println!("{}", session.path().display());
    println!("{}", tables::render_rows(&["Group", "Key", "Value"], &rows));
}

/// Prints the report. Returns whether everything passed.
fn print_validation(session: &ConfigSession) -> bool {
    let findings = editor::validate(&session.vars());
    for finding in &findings {
        let tag = if finding.ok { "[ OK ]" } else { "[WARN]" };
        println!("{} {}: {}", tag, finding.key, finding.message);
    }
    let all_ok = findings.iter().all(|f| f.ok);
    if all_ok {
        println!("configuration looks good");
    }
    all_ok
}

async fn report_changes(cfg: &EnvConfig, changed: &[String], restart: bool) -> Result<()> {
    if changed.is_empty() {
        println!("no changes");
        return Ok(());
    }
    println!("saved {} change(s): {}", changed.len(), changed.join(", "));
    let services = editor::affected_services(changed);
    if services.is_empty() {
        println!("no service restart needed");
        return Ok(());
    }
    let project = ComposeProject::for_env(cfg);
    if restart {
        project.restart(&services).await?;
        println!("restarted: {}", services.join(", "));
    } else {
        let mut extra = vec!["restart".to_string()];
        extra.extend(services.iter().cloned());
        println!("affected services: {}", services.join(", "));
        println!("restart with: docker {}", project.args(&extra[..]).join(" "));
    }
    Ok(())
}

enum MenuEntry {
    Key { key: String, label: String },
    Validate,
    Save,
    Quit,
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuEntry::Key { label, .. } => f.write_str(label),
            MenuEntry::Validate => f.write_str("[validate]"),
            MenuEntry::Save => f.write_str("[save and exit]"),
            MenuEntry::Quit => f.write_str("[quit without saving]"),
        }
    }
}

fn menu(session: &ConfigSession, show_secrets: bool) -> Vec<MenuEntry> {
    let vars = session.vars();
    let mut entries: Vec<MenuEntry> = editor::ordered_keys(&vars)
        .into_iter()
        .map(|(group, key)| {
            let label = format!(
                "{:<9} {} = {}",
                group,
                key,
                editor::display_value(&key, &vars[&key], show_secrets)
            );
            MenuEntry::Key { key, label }
        })
        .collect();
    entries.extend([MenuEntry::Validate, MenuEntry::Save, MenuEntry::Quit]);
    entries
}

fn edit_key(session: &mut ConfigSession, key: &str) -> Result<()> {
    if editor::is_secret(key) {
        let choice = prompts::select(
            &format!("{}:", key),
            vec!["enter a value", "generate a password"],
            0,
        )?;
        match choice {
            Answer::Value("generate a password") => {
                session.generate(key)?;
                println!("generated a new value for {}", key);
                return Ok(());
            }
            Answer::Value(_) => {}
            Answer::Back | Answer::Cancel => return Ok(()),
        }
    }
    let current = session.vars().get(key).cloned().unwrap_or_default();
    let default = if editor::is_secret(key) { "" } else { current.as_str() };
    if let Answer::Value(value) = prompts::text(&format!("{}:", key), default, "esc to keep the current value")? {
        session.set(key, &value);
    }
    Ok(())
}

/// Returns `true` when the operator chose to save.
fn interactive(session: &mut ConfigSession, show_secrets: bool) -> Result<bool> {
    let mut cursor = 0;
    loop {
        let entries = menu(session, show_secrets);
        let picked = prompts::select("Select a key to edit:", entries, cursor)?;
        match picked {
            Answer::Value(MenuEntry::Key { key, .. }) => {
                let vars = session.vars();
                cursor = editor::ordered_keys(&vars)
                    .iter()
                    .position(|(_, k)| *k == key)
                    .unwrap_or(0);
                edit_key(session, &key)?;
            }
            Answer::Value(MenuEntry::Validate) => {
                print_validation(session);
            }
            Answer::Value(MenuEntry::Save) => return Ok(true),
            Answer::Value(MenuEntry::Quit) | Answer::Back | Answer::Cancel => return Ok(false),
        }
    }
}

pub async fn handle_config(args: ConfigArgs) -> Result<()> {
    info!("Handling config command...");
    let ctx = CommandContext::load()?;
    let cfg = ctx.env_or_first(args.env.env.as_deref())?;
    let mut session = ConfigSession::load(&cfg.dotenv_path())?;
    debug!("Editing {} for {}", session.path().display(), cfg.env);

    for raw in &args.set {
        let (key, value) = editor::parse_assignment(raw)?;
        session.set(&key, &value);
    }
    for key in &args.generate {
        session.generate(key)?;
        println!("generated a new value for {}", key);
    }

    let mutating = !args.set.is_empty() || !args.generate.is_empty();
    if args.edit {
        if interactive(&mut session, args.show_secrets)? {
            let changed = session.save()?;
            report_changes(&cfg, &changed, args.restart).await?;
        } else if !session.changed_keys().is_empty() {
            println!("discarded changes");
        }
    } else if mutating {
        let changed = session.save()?;
        report_changes(&cfg, &changed, args.restart).await?;
    }

    if args.validate {
        print_validation(&session);
    } else if !mutating && !args.edit {
        print_listing(&session, args.show_secrets);
    }
    Ok(())
}
