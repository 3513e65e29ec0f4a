//! # stackctl `.env` Store
//!
//! File: cli/src/core/dotenv.rs
//!
//! ## Overview
//!
//! Every environment keeps its runtime secrets and settings in a flat
//! `KEY=value` file. Operators edit this file by hand, so programmatic
//! updates must not disturb anything they wrote: comments, blank lines,
//! ordering and unrelated entries all survive a rewrite byte-for-byte.
//!
//! ## Architecture
//!
//! `DotEnv` keeps the parsed file as a list of lines. Entry lines remember
//! their original text; only lines whose key is explicitly `set` are
//! re-rendered as `KEY=value`. Keys that were not present are appended at
//! the end in the order they were set. Every line keeps its own terminator,
//! so a CRLF file stays CRLF. Reads strip surrounding whitespace and double
//! quotes from values.
//!
use crate::common::fs::io;
use crate::core::error::{Result, StackError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const DOTENV_MODE: u32 = 0o640;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Blank lines, comments and anything that is not `KEY=value`.
    Verbatim(String),
    Entry {
        key: String,
        value: String,
        raw: Option<String>,
    },
}

/// A line plus its terminator: `"\n"`, `"\r\n"` or `""` for a final
/// unterminated line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    line: Line,
    eol: &'static str,
}

/// Line-preserving view of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotEnv {
    rows: Vec<Row>,
}

fn split_eol(segment: &str) -> (&str, &'static str) {
    if let Some(body) = segment.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = segment.strip_suffix('\n') {
        (body, "\n")
    } else {
        (segment, "")
    }
}

fn parse_line(line: &str) -> Line {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Verbatim(line.to_string());
    }
    match trimmed.split_once('=') {
        Some((key, value)) => Line::Entry {
            key: key.trim().to_string(),
            value: unquote(value),
            raw: Some(line.to_string()),
        },
        None => Line::Verbatim(line.to_string()),
    }
}

impl DotEnv {
    pub fn parse(content: &str) -> Self {
        let rows = content
            .split_inclusive('\n')
            .map(|segment| {
                let (body, eol) = split_eol(segment);
                Row {
                    line: parse_line(body),
                    eol,
                }
            })
            .collect();
        Self { rows }
    }

    /// Reads `path`; a missing file is reported as `StackError::DotEnvMissing`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(StackError::DotEnvMissing {
                path: path.to_path_buf()
            });
        }
        Ok(Self::parse(&io::read_file_to_string(path)?))
    }

    /// All entries as a map sorted by key. A key listed twice keeps its last value.
    pub fn vars(&self) -> BTreeMap<String, String> {
        self.rows
            .iter()
            .filter_map(|row| match &row.line {
                Line::Entry { key, value, .. } => Some((key.clone(), value.clone())),
                Line::Verbatim(_) => None,
            })
            .collect()
    }

    /// The terminator appended lines use: CRLF if the file already uses it.
    fn newline(&self) -> &'static str {
        if self.rows.iter().any(|row| row.eol == "\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Replaces every existing entry for `key` in place, or appends one.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut found = false;
        for row in &mut self.rows {
            if let Line::Entry { key: k, value: v, raw } = &mut row.line {
                if k == key {
                    *v = value.to_string();
                    *raw = None;
                    found = true;
                }
            }
        }
        if !found {
            let eol = self.newline();
            if let Some(last) = self.rows.last_mut() {
                if last.eol.is_empty() {
                    last.eol = eol;
                }
            }
            self.rows.push(Row {
                line: Line::Entry {
                    key: key.to_string(),
                    value: value.to_string(),
                    raw: None,
                },
                eol,
            });
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            match &row.line {
                Line::Verbatim(text) | Line::Entry { raw: Some(text), .. } => out.push_str(text),
                Line::Entry {
                    key,
                    value,
                    raw: None,
                } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
            }
            out.push_str(row.eol);
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_string_to_file_with_mode(path, &self.render(), DOTENV_MODE)
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// Reads `path` into a key/value map.
pub fn read_vars(path: &Path) -> Result<BTreeMap<String, String>> {
    Ok(DotEnv::load(path)?.vars())
}

/// Rewrites `path` applying `updates`, preserving every untouched line.
///
/// When the file does not exist yet it is created with the updates in key order.
pub fn update_file(path: &Path, updates: &BTreeMap<String, String>) -> Result<()> {
    let mut doc = if path.exists() {
        DotEnv::load(path)?
    } else {
        debug!("{} does not exist, creating it", path.display());
        DotEnv::default()
    };
    for (key, value) in updates {
        doc.set(key, value);
    }
    doc.save(path)
}
