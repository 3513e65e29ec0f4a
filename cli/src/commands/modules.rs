//! # stackctl Module Manager
//!
//! File: cli/src/commands/modules.rs
//!
//! ## Overview
//!
//! `stackctl modules --list` prints the catalog as a table with one status
//! column per module: `enabled`, `dependency` (pulled in by an enabled
//! module) or blank.
//!
//! Without `--list` the operator gets a multi-select pre-populated with the
//! current manifest. Dependencies of the selection are added automatically
//! and reported, the manifest is saved, and an apply is offered.
//!
use crate::commands::apply::run_apply;
use crate::commands::status::modules_line;
use crate::commands::{CommandContext, OptionalEnvArg};
use crate::common::ui::prompts::{self, Answer};
use crate::common::ui::tables;
use crate::core::error::Result;
use crate::stack::catalog::Catalog;
use crate::stack::enabled::{self, EnabledSet};
use clap::Parser;
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "List, enable and disable modules for an environment")]
pub struct ModulesArgs {
    #[command(flatten)]
    pub env: OptionalEnvArg,

    /// Print the module table and exit.
    #[arg(long)]
    pub list: bool,

    /// Apply after saving without asking.
    #[arg(long)]
    pub apply: bool,
}

pub const LIST_HEADERS: [&str; 5] = ["CATEGORY", "MODULE", "PORTS", "DESCRIPTION", "STATUS"];

/// Status column value for one module.
pub fn module_status(name: &str, set: &EnabledSet, effective: &BTreeSet<String>) -> &'static str {
    if set.contains(name) {
        "enabled"
    } else if effective.contains(name) {
        "dependency"
    } else {
        ""
    }
}

/// Table rows ordered by category, then module name.
pub fn list_rows(catalog: &Catalog, set: &EnabledSet) -> Vec<Vec<String>> {
    let effective = catalog.close_over_dependencies(set.iter());
    catalog
        .by_category()
        .into_iter()
        .flat_map(|(category, modules)| {
            let effective = &effective;
            modules.into_iter().map(move |m| {
                vec![
                    category.to_string(),
                    m.name.clone(),
                    m.ports_label(),
                    m.description.clone(),
                    module_status(&m.name, set, effective).to_string(),
                ]
            })
        })
        .collect()
}

/// Closes a selection over the dependency graph.
///
/// Returns the resulting set and one `(dependency, required_by)` note per
/// module that was not selected but had to be added.
pub fn resolve_selection(catalog: &Catalog, selected: &[String]) -> (EnabledSet, Vec<(String, String)>) {
    let picked: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    let closed = catalog.close_over_dependencies(picked.iter().copied());
    let mut notes = Vec::new();
    for dep in closed.iter().filter(|n| !picked.contains(n.as_str())) {
        let required_by = picked
            .iter()
            .find(|p| catalog.close_over_dependencies([**p]).contains(dep))
            .map(|p| p.to_string())
            .unwrap_or_default();
        notes.push((dep.clone(), required_by));
    }
    (EnabledSet::from_names(closed), notes)
}

struct Choice {
    name: String,
    label: String,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

pub async fn handle_modules(args: ModulesArgs) -> Result<()> {
    info!("Handling modules command...");
    let ctx = CommandContext::load()?;
    let cfg = ctx.env_or_first(args.env.env.as_deref())?;
    let current = enabled::load(&cfg)?;

    if args.list {
        println!("environment: {}", cfg.env);
        println!("{}", tables::render_rows(&LIST_HEADERS, &list_rows(&ctx.catalog, &current)));
        return Ok(());
    }

    let choices: Vec<Choice> = ctx
        .catalog
        .modules()
        .map(|m| Choice {
            name: m.name.clone(),
            label: format!("{:<14} {:<16} {}", m.name, m.ports_label(), m.description),
        })
        .collect();
    let preselected: Vec<usize> = choices
        .iter()
        .enumerate()
        .filter(|(_, c)| current.contains(&c.name))
        .map(|(i, _)| i)
        .collect();

    let picked = match prompts::multi_select(&format!("Modules for {}:", cfg.env), choices, &preselected)? {
        Answer::Value(picked) => picked,
        Answer::Back | Answer::Cancel => {
            println!("no changes");
            return Ok(());
        }
    };
    let names: Vec<String> = picked.into_iter().map(|c| c.name).collect();
    let (next, notes) = resolve_selection(&ctx.catalog, &names);
    for (dep, required_by) in &notes {
        println!("auto-enabled {} (required by {})", dep, required_by);
    }

    // Names the catalog no longer knows stay in the manifest.
    let mut merged = next;
    for unknown in current.iter().filter(|n| !ctx.catalog.contains(n)) {
        merged.insert(unknown);
    }
    if merged == current {
        println!("no changes");
        return Ok(());
    }
    enabled::save(&cfg, &merged)?;
    let listed: Vec<String> = merged.iter().map(str::to_string).collect();
    println!("saved modules for {}: {}", cfg.env, modules_line(&listed));

    let apply_now = args.apply
        || matches!(prompts::confirm("Apply now?", true)?, Answer::Value(true));
    if apply_now {
        let mut cfg = cfg;
        cfg.hydrate_from_dotenv()?;
        let modules = run_apply(&ctx, &cfg, false).await?;
        println!("applied {} with modules: {}", cfg.env, modules_line(&modules));
    } else {
        println!("run: stackctl apply --env {}", cfg.env);
    }
    Ok(())
}
