//! # stackctl Template Renderer
//!
//! File: cli/src/core/templating.rs
//!
//! ## Overview
//!
//! Every generated artifact (compose fragments, nginx confs, systemd units,
//! `.env`, the backup script) starts life as a template rendered against a
//! per-environment `RenderContext`. Rendering is strict: a placeholder that
//! does not name a context field is an error, so a literal `{{ ... }}` can
//! never leak into a production config file.
//!
//! ## Architecture
//!
//! The renderer uses Tera's one-off rendering with autoescaping disabled.
//! Tera already refuses to render an unknown variable; this module turns the
//! resulting error chain into a single `StackError::Template` naming the
//! template. Rendering has no side effects, so identical inputs always give
//! identical output.
//!
//! Available placeholders: `env`, `domain`, `email`, `network_name`,
//! `stack_root`, `data_root`, `backup_root`.
//!
//! ## Examples
//!
//! ```rust
//! let ctx = cfg.render_context();
//! let text = templating::render_str("inline", "server_name {{ domain }};", &ctx)?;
//! let unit = templating::render_file(&templates.join("systemd/stackctl-env.service"), &ctx)?;
//! ```
//!
use crate::common::fs::io;
use crate::core::error::{Result, StackError};
use serde::Serialize;
use std::path::Path;
use tera::Tera;
use tracing::debug;

/// Values exposed to every template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    pub env: String,
    pub domain: String,
    pub email: String,
    pub network_name: String,
    pub stack_root: String,
    pub data_root: String,
    pub backup_root: String,
}

/// Renders `content`; `name` only labels errors.
pub fn render_str(name: &str, content: &str, ctx: &RenderContext) -> Result<String> {
    let tera_ctx = tera::Context::from_serialize(ctx).map_err(|e| StackError::Template {
        template: name.to_string(),
        message: describe(&e),
    })?;
    let rendered = Tera::one_off(content, &tera_ctx, false).map_err(|e| StackError::Template {
        template: name.to_string(),
        message: describe(&e),
    })?;
    debug!("Rendered template '{}' ({} bytes)", name, rendered.len());
    Ok(rendered)
}

/// Reads and renders the template at `path`.
pub fn render_file(path: &Path, ctx: &RenderContext) -> Result<String> {
    let content = io::read_file_to_string(path)?;
    render_str(&path.display().to_string(), &content, ctx)
}

/// Flattens Tera's nested error chain into one line.
fn describe(err: &tera::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn ctx() -> RenderContext {
        RenderContext {
            env: "prod".into(),
            domain: "example.org".into(),
            email: "ops@example.org".into(),
            network_name: "prod_net".into(),
            stack_root: "/srv/stack".into(),
            data_root: "/srv/data".into(),
            backup_root: "/srv/backups".into(),
        }
    }

    #[test]
    fn test_render_all_placeholders() -> Result<()> {
        let out = render_str(
            "all",
            "{{ env }}|{{ domain }}|{{ email }}|{{ network_name }}|{{ stack_root }}|{{ data_root }}|{{ backup_root }}",
            &ctx(),
        )?;
        assert_eq!(
            out,
            "prod|example.org|ops@example.org|prod_net|/srv/stack|/srv/data|/srv/backups"
        );
        Ok(())
    }

    #[test]
    fn test_unknown_placeholder_fails_with_name() {
        let err = render_str("nginx/app.conf", "server_name {{ hostname }};", &ctx()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("nginx/app.conf"));
        assert!(text.contains("hostname"));
    }

    #[test]
    fn test_invalid_syntax_fails() {
        assert!(render_str("broken", "Hello {{ domain", &ctx()).is_err());
    }

    #[test]
    fn test_does_not_escape_or_touch_shell_syntax() -> Result<()> {
        let out = render_str(
            "script",
            "PGPASSWORD=\"${POSTGRES_PASSWORD}\" <a&b> {{ domain }}",
            &ctx(),
        )?;
        assert_eq!(out, "PGPASSWORD=\"${POSTGRES_PASSWORD}\" <a&b> example.org");
        Ok(())
    }

    #[test]
    fn test_render_is_repeatable() -> Result<()> {
        let tpl = "networks:\n  {{ network_name }}:\n    name: {{ network_name }}\n";
        assert_eq!(render_str("a", tpl, &ctx())?, render_str("a", tpl, &ctx())?);
        Ok(())
    }

    #[test]
    fn test_render_file_missing() {
        let temp = tempdir().unwrap();
        assert!(render_file(&temp.path().join("nope.conf"), &ctx()).is_err());
    }

    #[test]
    fn test_render_file() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("unit.service");
        fs::write(&path, "WorkingDirectory={{ stack_root }}/{{ env }}\n")?;
        assert_eq!(
            render_file(&path, &ctx())?,
            "WorkingDirectory=/srv/stack/prod\n"
        );
        Ok(())
    }
}
