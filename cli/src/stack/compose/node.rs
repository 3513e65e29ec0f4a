//! # Compose Keyed Tree
//!
//! File: cli/src/stack/compose/node.rs
//!
//! ## Overview
//!
//! Compose documents are merged as a closed tagged tree instead of raw
//! `serde_yaml::Value`s: every node is a scalar, an ordered sequence, or a
//! mapping with string keys. Anything YAML allows that compose files never
//! need (non-scalar keys, custom tags) is rejected on conversion with a
//! `StackError::ComposeShape` naming the document and the key path.
//!
//! Mappings are `BTreeMap`s, so serialization order only depends on content.
//!
//! ## Merge rules
//!
//! `deep_merge(dst, src)` walks `src` key by key:
//! - key absent in `dst`: the source value is copied in
//! - mapping onto mapping: recurse
//! - sequence onto sequence: source items are appended after destination items
//! - anything else: the source value replaces the destination value
//!
use crate::core::error::StackError;
use serde_yaml::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub type Mapping = BTreeMap<String, Node>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

impl Node {
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Converts a parsed YAML value. `source_name` only labels errors.
    pub fn from_yaml(value: Value, source_name: &str) -> Result<Self, StackError> {
        convert(value, source_name, &mut Vec::new())
    }

    /// Builds the YAML value used for serialization.
    pub fn into_yaml(self) -> Value {
        match self {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(b),
            Node::Scalar(Scalar::Number(n)) => Value::Number(n),
            Node::Scalar(Scalar::String(s)) => Value::String(s),
            Node::Sequence(items) => Value::Sequence(items.into_iter().map(Node::into_yaml).collect()),
            Node::Mapping(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (key, node) in map {
                    out.insert(Value::String(key), node.into_yaml());
                }
                Value::Mapping(out)
            }
        }
    }
}

fn shape_error(source_name: &str, path: &[String], message: &str) -> StackError {
    let location = if path.is_empty() {
        "document root".to_string()
    } else {
        path.join(".")
    };
    StackError::ComposeShape {
        source_name: source_name.to_string(),
        message: format!("{} at {}", message, location),
    }
}

fn convert(value: Value, source_name: &str, path: &mut Vec<String>) -> Result<Node, StackError> {
    match value {
        Value::Null => Ok(Node::Scalar(Scalar::Null)),
        Value::Bool(b) => Ok(Node::Scalar(Scalar::Bool(b))),
        Value::Number(n) => Ok(Node::Scalar(Scalar::Number(n))),
        Value::String(s) => Ok(Node::Scalar(Scalar::String(s))),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                path.push(format!("[{}]", index));
                out.push(convert(item, source_name, path)?);
                path.pop();
            }
            Ok(Node::Sequence(out))
        }
        Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, item) in map {
                let key = match key {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return Err(shape_error(source_name, path, "non-scalar mapping key")),
                };
                path.push(key.clone());
                let node = convert(item, source_name, path)?;
                path.pop();
                out.insert(key, node);
            }
            Ok(Node::Mapping(out))
        }
        Value::Tagged(tagged) => Err(shape_error(
            source_name,
            path,
            &format!("unsupported tag {}", tagged.tag),
        )),
    }
}

/// Merges `src` into `dst` in place.
pub fn deep_merge(dst: &mut Mapping, src: Mapping) {
    for (key, incoming) in src {
        match dst.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (Node::Mapping(current), Node::Mapping(overlay)) => deep_merge(current, overlay),
                (Node::Sequence(current), Node::Sequence(extra)) => current.extend(extra),
                (current, replacement) => *current = replacement,
            },
        }
    }
}
