//! # Compose Assembler
//!
//! File: cli/src/stack/compose/mod.rs
//!
//! ## Overview
//!
//! Produces an environment's `compose.yml` from the template tree:
//!
//! 1. Render `base/compose.base.yml` and parse it into a `ComposeDocument`.
//! 2. For each effective module, in sorted order, render and deep-merge
//!    `modules/<name>/compose.yml` if the module ships one. Modules without
//!    an overlay are asset-only and skipped.
//! 3. Stamp the `x-stackctl` bookkeeping key with that same sorted list and a
//!    UTC timestamp.
//! 4. Serialize and replace the environment's compose file wholesale.
//!
//! Assembly (`assemble`) is pure; only `write_compose` touches the clock and
//! the filesystem, so identical inputs always produce identical documents.
//!
//! ## Examples
//!
//! ```rust
//! let modules = enabled::effective_modules(&cfg, &catalog)?;
//! let path = compose::write_compose(&cfg, &settings.templates_dir, &modules)?;
//! ```
//!
pub mod node;

use crate::common::fs::io;
use crate::core::config::EnvConfig;
use crate::core::error::{Result, StackError};
use crate::core::templating::{self, RenderContext};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use node::{Mapping, Node};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reserved top-level key carrying generation metadata.
pub const BOOKKEEPING_KEY: &str = "x-stackctl";
/// Overlay filename inside each module template directory.
pub const OVERLAY_FILENAME: &str = "compose.yml";

pub fn base_template_path(templates_dir: &Path) -> PathBuf {
    templates_dir.join("base").join("compose.base.yml")
}

pub fn overlay_template_path(templates_dir: &Path, module: &str) -> PathBuf {
    templates_dir
        .join("modules")
        .join(module)
        .join(OVERLAY_FILENAME)
}

/// A compose document as a top-level mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeDocument {
    root: Mapping,
}

impl ComposeDocument {
    /// Parses YAML text. An empty document is an empty mapping; any other
    /// non-mapping top level is a shape error naming `source_name`.
    pub fn parse(source_name: &str, text: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| StackError::ComposeParse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        match Node::from_yaml(value, source_name)? {
            Node::Mapping(root) => Ok(Self { root }),
            Node::Scalar(node::Scalar::Null) => Ok(Self::default()),
            _ => Err(StackError::ComposeShape {
                source_name: source_name.to_string(),
                message: "top level must be a mapping".to_string(),
            }
            .into()),
        }
    }

    pub fn merge(&mut self, overlay: ComposeDocument) {
        node::deep_merge(&mut self.root, overlay.root);
    }

    /// Overwrites the bookkeeping fields, creating the key (or replacing a
    /// non-mapping value) as needed.
    pub fn stamp(&mut self, modules: &[String], generated_at: DateTime<Utc>) {
        let slot = self
            .root
            .entry(BOOKKEEPING_KEY.to_string())
            .or_insert_with(|| Node::Mapping(Mapping::new()));
        if !matches!(slot, Node::Mapping(_)) {
            *slot = Node::Mapping(Mapping::new());
        }
        if let Node::Mapping(meta) = slot {
            meta.insert(
                "enabled_modules".to_string(),
                Node::Sequence(modules.iter().map(Node::string).collect()),
            );
            meta.insert(
                "generated_at".to_string(),
                Node::string(generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    /// Names under the `services` key, sorted.
    pub fn service_names(&self) -> Vec<&str> {
        self.get("services")
            .and_then(Node::as_mapping)
            .map(|services| services.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn to_yaml(&self) -> Result<String> {
        let value = Node::Mapping(self.root.clone()).into_yaml();
        serde_yaml::to_string(&value).context("Failed to serialize compose document")
    }
}

/// The order overlays are merged in and the list that gets stamped.
pub fn merge_order(modules: &[String]) -> Vec<String> {
    let mut ordered = modules.to_vec();
    ordered.sort();
    ordered.dedup();
    ordered
}

/// Renders and merges the base template with every available module overlay.
pub fn assemble(templates_dir: &Path, ctx: &RenderContext, modules: &[String]) -> Result<ComposeDocument> {
    let base_path = base_template_path(templates_dir);
    let rendered = templating::render_file(&base_path, ctx)
        .with_context(|| format!("Failed to render base compose template {}", base_path.display()))?;
    let mut document = ComposeDocument::parse("base/compose.base.yml", &rendered)?;

    for module in &merge_order(modules) {
        let overlay_path = overlay_template_path(templates_dir, module);
        if !overlay_path.is_file() {
            debug!("Module '{}' has no compose overlay, skipping", module);
            continue;
        }
        let rendered = templating::render_file(&overlay_path, ctx)
            .with_context(|| format!("Failed to render compose overlay for module '{}'", module))?;
        let overlay = ComposeDocument::parse(module, &rendered)
            .with_context(|| format!("Invalid compose overlay for module '{}'", module))?;
        document.merge(overlay);
        debug!("Merged compose overlay for module '{}'", module);
    }

    Ok(document)
}

/// Assembles, stamps and writes `<env dir>/compose.yml`. Returns the path.
pub fn write_compose(cfg: &EnvConfig, templates_dir: &Path, modules: &[String]) -> Result<PathBuf> {
    let ordered = merge_order(modules);
    let mut document = assemble(templates_dir, &cfg.render_context(), &ordered)?;
    document.stamp(&ordered, Utc::now());
    let yaml = document.to_yaml()?;

    let target = cfg.compose_path();
    io::ensure_dir_exists(&cfg.env_dir)?;
    io::replace_file_atomic(&target, &yaml, io::FILE_MODE)?;
    info!(
        "Wrote {} ({} service(s), {} module(s) merged)",
        target.display(),
        document.service_names().len(),
        ordered.len()
    );
    Ok(target)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn ctx() -> RenderContext {
        RenderContext {
            env: "dev".into(),
            domain: "example.org".into(),
            email: "ops@example.org".into(),
            network_name: "dev_net".into(),
            stack_root: "/srv/stack".into(),
            data_root: "/srv/data".into(),
            backup_root: "/srv/backups".into(),
        }
    }

    fn template_tree() -> TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("base")).unwrap();
        fs::write(
            root.join("base/compose.base.yml"),
            "services:\n  nginx:\n    image: nginx:stable\n    networks: [{{ network_name }}]\nnetworks:\n  {{ network_name }}:\n    name: {{ network_name }}\n",
        )
        .unwrap();
        for (module, body) in [
            ("grafana", "services:\n  grafana:\n    image: grafana/grafana\n    profiles: [grafana]\n"),
            ("loki", "services:\n  nginx:\n    depends_on: [loki]\n  loki:\n    image: grafana/loki\n"),
        ] {
            fs::create_dir_all(root.join("modules").join(module)).unwrap();
            fs::write(root.join("modules").join(module).join("compose.yml"), body).unwrap();
        }
        fs::create_dir_all(root.join("modules/backup")).unwrap();
        fs::write(root.join("modules/backup/README"), "assets only\n").unwrap();
        temp
    }

    fn modules(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_assemble_merges_enabled_overlays_only() -> Result<()> {
        let templates = template_tree();
        let doc = assemble(templates.path(), &ctx(), &modules(&["grafana"]))?;
        assert_eq!(doc.service_names(), vec!["grafana", "nginx"]);
        assert!(doc.get("networks").unwrap().as_mapping().unwrap().contains_key("dev_net"));
        Ok(())
    }

    #[test]
    fn test_assemble_skips_module_without_overlay() -> Result<()> {
        let templates = template_tree();
        let doc = assemble(templates.path(), &ctx(), &modules(&["backup", "not-on-disk"]))?;
        assert_eq!(doc.service_names(), vec!["nginx"]);
        Ok(())
    }

    #[test]
    fn test_overlay_extends_existing_service() -> Result<()> {
        let templates = template_tree();
        let doc = assemble(templates.path(), &ctx(), &modules(&["loki"]))?;
        let nginx = doc.get("services").unwrap().as_mapping().unwrap()["nginx"]
            .as_mapping()
            .unwrap()
            .clone();
        assert_eq!(nginx["image"].as_str(), Some("nginx:stable"));
        assert_eq!(nginx["depends_on"].as_sequence().unwrap().len(), 1);
        Ok(())
    }

    #[test]
    fn test_broken_overlay_names_module() {
        let templates = template_tree();
        fs::write(
            templates.path().join("modules/grafana/compose.yml"),
            "services: [unclosed\n",
        )
        .unwrap();
        let err = assemble(templates.path(), &ctx(), &modules(&["grafana"])).unwrap_err();
        assert!(format!("{:#}", err).contains("grafana"));
    }

    #[test]
    fn test_non_mapping_overlay_is_rejected() {
        let templates = template_tree();
        fs::write(templates.path().join("modules/loki/compose.yml"), "- just\n- a list\n").unwrap();
        let err = assemble(templates.path(), &ctx(), &modules(&["loki"])).unwrap_err();
        let text = format!("{:#}", err);
        assert!(text.contains("loki"));
        assert!(text.contains("top level must be a mapping"));
    }

    #[test]
    fn test_assembly_is_deterministic() -> Result<()> {
        let templates = template_tree();
        let list = modules(&["loki", "grafana"]);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let mut first = assemble(templates.path(), &ctx(), &list)?;
        first.stamp(&merge_order(&list), at);
        let mut reversed = list.clone();
        reversed.reverse();
        let mut second = assemble(templates.path(), &ctx(), &reversed)?;
        second.stamp(&merge_order(&reversed), at);

        assert_eq!(first.to_yaml()?, second.to_yaml()?);
        Ok(())
    }

    #[test]
    fn test_stamp_replaces_bookkeeping() -> Result<()> {
        let mut doc = ComposeDocument::parse("inline", "x-stackctl: stale\nservices: {}\n")?;
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        doc.stamp(&modules(&["dozzle", "socket-proxy"]), at);

        let reparsed = ComposeDocument::parse("out", &doc.to_yaml()?)?;
        let meta = reparsed.get(BOOKKEEPING_KEY).unwrap().as_mapping().unwrap();
        assert_eq!(meta["generated_at"].as_str(), Some("2024-01-02T03:04:05Z"));
        let listed: Vec<&str> = meta["enabled_modules"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Node::as_str)
            .collect();
        assert_eq!(listed, vec!["dozzle", "socket-proxy"]);
        assert!(reparsed.get("services").is_some());
        Ok(())
    }

    #[test]
    fn test_write_compose_stamps_sorted_unique_modules() -> Result<()> {
        use crate::core::config::{Environment, Settings};

        let templates = template_tree();
        let out = tempdir()?;
        let settings = Settings {
            stack_root: out.path().join("stack"),
            data_root: out.path().join("data"),
            backup_root: out.path().join("backups"),
            templates_dir: templates.path().to_path_buf(),
            systemd_unit_dir: out.path().join("units"),
        };
        let cfg = EnvConfig::for_env(Environment::Dev, &settings);

        let path = write_compose(&cfg, templates.path(), &modules(&["loki", "grafana", "grafana"]))?;
        let written = ComposeDocument::parse("written", &fs::read_to_string(path)?)?;
        let meta = written.get(BOOKKEEPING_KEY).unwrap().as_mapping().unwrap();
        let listed: Vec<&str> = meta["enabled_modules"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Node::as_str)
            .collect();
        assert_eq!(listed, vec!["grafana", "loki"]);
        Ok(())
    }

    #[test]
    fn test_empty_overlay_is_empty_mapping() -> Result<()> {
        assert_eq!(ComposeDocument::parse("empty", "")?, ComposeDocument::default());
        Ok(())
    }
}
