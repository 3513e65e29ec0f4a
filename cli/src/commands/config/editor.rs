//! # .env Editor Model
//!
//! File: cli/src/commands/config/editor.rs
//!
//! ## Overview
//!
//! The non-visual half of `stackctl config`: which keys are secrets, how keys
//! are grouped for display, validation rules, password generation and the
//! mapping from changed keys to the compose services that must restart.
//! `ConfigSession` holds a loaded `.env` plus a snapshot of the original
//! values so changes can be detected after edits.
//!
use crate::core::dotenv::DotEnv;
use crate::core::error::{Result, StackError};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const SECRET_KEYS: [&str; 7] = [
    "POSTGRES_PASSWORD",
    "MYSQL_ROOT_PASSWORD",
    "RESTIC_PASSWORD",
    "KC_DB_PASSWORD",
    "KEYCLOAK_ADMIN_PASSWORD",
    "SECRET_KEY",
    "JWT_SECRET",
];

pub const KEY_GROUPS: [(&str, &[&str]); 4] = [
    ("Core", &["DOMAIN", "ADMIN_EMAIL", "ENV_NAME"]),
    (
        "Databases",
        &["POSTGRES_USER", "POSTGRES_PASSWORD", "POSTGRES_DB", "MYSQL_ROOT_PASSWORD", "KC_DB_PASSWORD"],
    ),
    ("Security", &["SECRET_KEY", "JWT_SECRET", "KEYCLOAK_ADMIN_PASSWORD"]),
    ("Backup", &["RESTIC_REPOSITORY", "RESTIC_PASSWORD"]),
];

pub const OTHER_GROUP: &str = "Other";
pub const MASK: &str = "********";
pub const GENERATED_PASSWORD_LEN: usize = 32;
pub const MIN_SECRET_LEN: usize = 8;

const REQUIRED_KEYS: [&str; 2] = ["DOMAIN", "ADMIN_EMAIL"];
const PLACEHOLDERS: [(&str, &str); 2] = [("DOMAIN", "example.com"), ("ADMIN_EMAIL", "admin@example.com")];

const RESTART_MAP: [(&str, &[&str]); 10] = [
    ("POSTGRES_PASSWORD", &["postgres"]),
    ("POSTGRES_USER", &["postgres"]),
    ("POSTGRES_DB", &["postgres"]),
    ("MYSQL_ROOT_PASSWORD", &["mariadb"]),
    ("KC_DB_PASSWORD", &["keycloak"]),
    ("KEYCLOAK_ADMIN_PASSWORD", &["keycloak"]),
    ("DOMAIN", &["nginx", "keycloak", "frontend", "backend"]),
    ("ADMIN_EMAIL", &["certbot"]),
    ("SECRET_KEY", &["backend"]),
    ("JWT_SECRET", &["backend"]),
];

pub fn is_secret(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

pub fn group_for_key(key: &str) -> &'static str {
    KEY_GROUPS
        .iter()
        .find(|(_, keys)| keys.contains(&key))
        .map(|(name, _)| *name)
        .unwrap_or(OTHER_GROUP)
}

/// Keys present in `vars` as `(group, key)`: grouped keys in group order
/// first, then every remaining key sorted under `Other`.
pub fn ordered_keys(vars: &BTreeMap<String, String>) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    for (group, keys) in KEY_GROUPS {
        for key in keys.iter().filter(|k| vars.contains_key(**k)) {
            out.push((group, key.to_string()));
        }
    }
    out.extend(
        vars.keys()
            .filter(|k| group_for_key(k) == OTHER_GROUP)
            .map(|k| (OTHER_GROUP, k.clone())),
    );
    out
}

pub fn display_value(key: &str, value: &str, show_secrets: bool) -> String {
    if is_secret(key) && !show_secrets && !value.is_empty() {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Random lowercase hex string of `len` characters from the OS RNG.
pub fn generate_password(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    OsRng.fill_bytes(&mut bytes);
    let mut hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(len);
    hex
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub key: String,
    pub ok: bool,
    pub message: String,
}

impl Finding {
    fn new(key: &str, ok: bool, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            ok,
            message: message.into(),
        }
    }
}

/// Required keys, placeholder values and secret lengths.
pub fn validate(vars: &BTreeMap<String, String>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for key in REQUIRED_KEYS {
        match vars.get(key).filter(|v| !v.is_empty()) {
            Some(_) => findings.push(Finding::new(key, true, "set")),
            None => findings.push(Finding::new(key, false, "required but missing")),
        }
    }
    for (key, placeholder) in PLACEHOLDERS {
        if vars.get(key).is_some_and(|v| v == placeholder) {
            findings.push(Finding::new(
                key,
                false,
                format!("still using placeholder '{}'", placeholder),
            ));
        }
    }
    for key in SECRET_KEYS {
        let Some(value) = vars.get(key) else {
            continue;
        };
        let len = value.chars().count();
        if len < MIN_SECRET_LEN {
            findings.push(Finding::new(key, false, format!("password too short (< {} chars)", MIN_SECRET_LEN)));
        } else {
            findings.push(Finding::new(key, true, format!("{} chars", len)));
        }
    }
    findings
}

/// Services to restart for the given changed keys, sorted and deduplicated.
pub fn affected_services<S: AsRef<str>>(changed: &[S]) -> Vec<String> {
    let set: BTreeSet<&str> = changed
        .iter()
        .filter_map(|k| RESTART_MAP.iter().find(|(key, _)| *key == k.as_ref()))
        .flat_map(|(_, services)| services.iter().copied())
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Parses `KEY=VALUE` from the command line.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| StackError::Config(format!("expected KEY=VALUE, got '{}'", raw)))?;
    let key = key.trim();
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        anyhow::bail!(StackError::Config(format!("invalid key in '{}'", raw)));
    }
    Ok((key.to_string(), value.to_string()))
}

/// A loaded `.env` being edited.
#[derive(Debug, Clone)]
pub struct ConfigSession {
    path: PathBuf,
    doc: DotEnv,
    original: BTreeMap<String, String>,
}

impl ConfigSession {
    pub fn load(path: &Path) -> Result<Self> {
        let doc = DotEnv::load(path)?;
        let original = doc.vars();
        Ok(Self {
            path: path.to_path_buf(),
            doc,
            original,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vars(&self) -> BTreeMap<String, String> {
        self.doc.vars()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.doc.set(key, value);
    }

    /// Generates and stores a password. Only secret keys qualify.
    pub fn generate(&mut self, key: &str) -> Result<String> {
        if !is_secret(key) {
            anyhow::bail!(StackError::Config(format!(
                "{} is not a secret key; passwords can only be generated for: {}",
                key,
                SECRET_KEYS.join(", ")
            )));
        }
        let password = generate_password(GENERATED_PASSWORD_LEN);
        self.doc.set(key, &password);
        Ok(password)
    }

    /// Keys whose value differs from the file as loaded, sorted.
    pub fn changed_keys(&self) -> Vec<String> {
        let current = self.doc.vars();
        current
            .iter()
            .filter(|(k, v)| self.original.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Writes the file and makes the saved state the new baseline.
    pub fn save(&mut self) -> Result<Vec<String>> {
        let changed = self.changed_keys();
        if !changed.is_empty() {
            self.doc.save(&self.path)?;
            self.original = self.doc.vars();
        }
        Ok(changed)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_grouping_and_order() {
        let v = vars(&[("ZED", "1"), ("JWT_SECRET", "x"), ("DOMAIN", "d"), ("APP_PORT", "8080")]);
        let ordered = ordered_keys(&v);
        assert_eq!(
            ordered,
            vec![
                ("Core", "DOMAIN".to_string()),
                ("Security", "JWT_SECRET".to_string()),
                ("Other", "APP_PORT".to_string()),
                ("Other", "ZED".to_string()),
            ]
        );
        assert_eq!(group_for_key("RESTIC_PASSWORD"), "Backup");
    }

    #[test]
    fn test_secret_masking() {
        assert_eq!(display_value("POSTGRES_PASSWORD", "hunter22", false), MASK);
        assert_eq!(display_value("POSTGRES_PASSWORD", "hunter22", true), "hunter22");
        assert_eq!(display_value("DOMAIN", "example.org", false), "example.org");
    }

    #[test]
    fn test_generate_password_shape() {
        let pw = generate_password(GENERATED_PASSWORD_LEN);
        assert_eq!(pw.len(), 32);
        assert!(pw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(pw, generate_password(GENERATED_PASSWORD_LEN));
    }

    #[test]
    fn test_validate_flags_problems() {
        let findings = validate(&vars(&[
            ("DOMAIN", "example.com"),
            ("POSTGRES_PASSWORD", "short"),
            ("JWT_SECRET", "long-enough-secret"),
        ]));
        let bad: Vec<(&str, &str)> = findings
            .iter()
            .filter(|f| !f.ok)
            .map(|f| (f.key.as_str(), f.message.as_str()))
            .collect();
        assert!(bad.contains(&("ADMIN_EMAIL", "required but missing")));
        assert!(bad.contains(&("DOMAIN", "still using placeholder 'example.com'")));
        assert!(bad.contains(&("POSTGRES_PASSWORD", "password too short (< 8 chars)")));
        assert!(findings.iter().any(|f| f.key == "JWT_SECRET" && f.ok));
    }

    #[test]
    fn test_affected_services() {
        assert_eq!(
            affected_services(&["DOMAIN", "JWT_SECRET", "UNMAPPED"]),
            vec!["backend", "frontend", "keycloak", "nginx"]
        );
        assert!(affected_services::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_parse_assignment() -> Result<()> {
        assert_eq!(parse_assignment("DOMAIN=a=b")?, ("DOMAIN".into(), "a=b".into()));
        assert_eq!(parse_assignment("EMPTY=")?, ("EMPTY".into(), String::new()));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
        Ok(())
    }

    #[test]
    fn test_session_tracks_changes_and_preserves_layout() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join(".env");
        fs::write(&path, "# core\nDOMAIN=example.com\n\nSECRET_KEY=old\n")?;

        let mut session = ConfigSession::load(&path)?;
        assert!(session.changed_keys().is_empty());
        session.set("DOMAIN", "example.org");
        assert!(session.generate("DOMAIN").is_err());
        session.generate("SECRET_KEY")?;
        assert_eq!(session.save()?, vec!["DOMAIN", "SECRET_KEY"]);
        assert!(session.changed_keys().is_empty());

        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("# core\nDOMAIN=example.org\n\nSECRET_KEY="));
        Ok(())
    }
}
