// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ops-file patching: path-based `replace` and `remove` on a YAML tree.
//!
//! Paths use the syntax bosh ops files use:
//!
//! - `/key` map key; `/key?` creates it when missing, and every segment
//!   after the first `?` is optional too
//! - `/0` array index, `/-` append
//! - `/name=value` the array element whose `name` is `value`
//! - `~1` and `~0` escape `/` and `~` inside a segment

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid YAML: {0}")]
    Parse(String),
    #[error("invalid path {0:?}: must start with '/'")]
    InvalidPath(String),
    #[error("ops[{index}] {path}: {reason}")]
    Op { index: usize, path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Replace,
    Remove,
}

/// One entry of an ops file.
#[derive(Debug, Clone, Deserialize)]
pub struct Op {
    #[serde(rename = "type")]
    pub kind: OpKind,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Key { name: String, optional: bool },
    Index(usize),
    Append,
    Match { key: String, value: String, optional: bool },
}

fn parse_path(path: &str) -> Result<Vec<Token>, PatchError> {
    let rest = path.strip_prefix('/').ok_or_else(|| PatchError::InvalidPath(path.to_string()))?;
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let mut optional = false;
    let mut tokens = Vec::new();
    for raw in rest.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        let segment = match segment.strip_suffix('?') {
            Some(s) => {
                optional = true;
                s.to_string()
            }
            None => segment,
        };

        let token = if segment == "-" {
            Token::Append
        } else if let Ok(index) = segment.parse::<usize>() {
            Token::Index(index)
        } else if let Some((key, value)) = segment.split_once('=') {
            Token::Match { key: key.to_string(), value: value.to_string(), optional }
        } else {
            Token::Key { name: segment, optional }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn matches(item: &Value, key: &str, want: &str) -> bool {
    match item.get(key) {
        Some(Value::String(s)) => s == want,
        Some(Value::Number(n)) => n.to_string() == want,
        Some(Value::Bool(b)) => b.to_string() == want,
        _ => false,
    }
}

fn replace(node: &mut Value, tokens: &[Token], value: Value) -> Result<(), String> {
    let Some((token, rest)) = tokens.split_first() else {
        *node = value;
        return Ok(());
    };

    match token {
        Token::Key { name, optional } => {
            if node.is_null() && *optional {
                *node = Value::Mapping(Mapping::new());
            }
            let map = node.as_mapping_mut().ok_or_else(|| format!("expected a map to look up {name:?}"))?;
            if !map.contains_key(name.as_str()) {
                if !optional {
                    return Err(format!("expected to find a map key {name:?}"));
                }
                map.insert(Value::String(name.clone()), Value::Null);
            }
            match map.get_mut(name.as_str()) {
                Some(child) => replace(child, rest, value),
                None => Err(format!("expected to find a map key {name:?}")),
            }
        }
        Token::Index(index) => {
            let seq = node.as_sequence_mut().ok_or_else(|| format!("expected an array for index {index}"))?;
            let len = seq.len();
            let child =
                seq.get_mut(*index).ok_or_else(|| format!("index {index} out of range (length {len})"))?;
            replace(child, rest, value)
        }
        Token::Append => {
            if node.is_null() {
                *node = Value::Sequence(Vec::new());
            }
            let seq = node.as_sequence_mut().ok_or_else(|| "expected an array to append to".to_string())?;
            if rest.is_empty() {
                seq.push(value);
                return Ok(());
            }
            seq.push(Value::Null);
            match seq.last_mut() {
                Some(child) => replace(child, rest, value),
                None => Err("append failed".to_string()),
            }
        }
        Token::Match { key, value: want, optional } => {
            if node.is_null() && *optional {
                *node = Value::Sequence(Vec::new());
            }
            let seq = node.as_sequence_mut().ok_or_else(|| format!("expected an array to find {key}={want}"))?;
            let pos = match seq.iter().position(|item| matches(item, key, want)) {
                Some(pos) => pos,
                None if *optional => {
                    if rest.is_empty() {
                        seq.push(value);
                        return Ok(());
                    }
                    let mut stub = Mapping::new();
                    stub.insert(Value::String(key.clone()), Value::String(want.clone()));
                    seq.push(Value::Mapping(stub));
                    seq.len() - 1
                }
                None => return Err(format!("expected to find an array item with {key}={want}")),
            };
            match seq.get_mut(pos) {
                Some(child) => replace(child, rest, value),
                None => Err(format!("expected to find an array item with {key}={want}")),
            }
        }
    }
}

fn remove(node: &mut Value, tokens: &[Token]) -> Result<(), String> {
    let Some((token, rest)) = tokens.split_first() else {
        return Err("cannot remove the document root".to_string());
    };

    match token {
        Token::Key { name, optional } => {
            let Some(map) = node.as_mapping_mut() else {
                return if *optional { Ok(()) } else { Err(format!("expected a map to look up {name:?}")) };
            };
            if rest.is_empty() {
                if map.remove(name.as_str()).is_none() && !optional {
                    return Err(format!("expected to find a map key {name:?}"));
                }
                return Ok(());
            }
            match map.get_mut(name.as_str()) {
                Some(child) => remove(child, rest),
                None if *optional => Ok(()),
                None => Err(format!("expected to find a map key {name:?}")),
            }
        }
        Token::Index(index) => {
            let seq = node.as_sequence_mut().ok_or_else(|| format!("expected an array for index {index}"))?;
            if *index >= seq.len() {
                return Err(format!("index {index} out of range (length {})", seq.len()));
            }
            if rest.is_empty() {
                seq.remove(*index);
                return Ok(());
            }
            match seq.get_mut(*index) {
                Some(child) => remove(child, rest),
                None => Err(format!("index {index} out of range")),
            }
        }
        Token::Append => Err("cannot remove '-'".to_string()),
        Token::Match { key, value: want, optional } => {
            let Some(seq) = node.as_sequence_mut() else {
                return if *optional {
                    Ok(())
                } else {
                    Err(format!("expected an array to find {key}={want}"))
                };
            };
            let Some(pos) = seq.iter().position(|item| matches(item, key, want)) else {
                return if *optional {
                    Ok(())
                } else {
                    Err(format!("expected to find an array item with {key}={want}"))
                };
            };
            if rest.is_empty() {
                seq.remove(pos);
                return Ok(());
            }
            match seq.get_mut(pos) {
                Some(child) => remove(child, rest),
                None => Err(format!("expected to find an array item with {key}={want}")),
            }
        }
    }
}

/// Parse an ops file. An empty document is an empty list.
pub fn parse_ops(ops: &str) -> Result<Vec<Op>, PatchError> {
    if ops.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str::<Option<Vec<Op>>>(ops)
        .map(Option::unwrap_or_default)
        .map_err(|e| PatchError::Parse(e.to_string()))
}

/// Apply `ops` to `doc` in order. Stops at the first failing op.
pub fn apply(doc: &mut Value, ops: &[Op]) -> Result<(), PatchError> {
    for (index, op) in ops.iter().enumerate() {
        let tokens = parse_path(&op.path)?;
        let result = match (op.kind, &op.value) {
            (OpKind::Replace, Some(value)) => replace(doc, &tokens, value.clone()),
            (OpKind::Replace, None) => Err("replace requires a value".to_string()),
            (OpKind::Remove, _) => remove(doc, &tokens),
        };
        result.map_err(|reason| PatchError::Op { index, path: op.path.clone(), reason })?;
    }
    Ok(())
}

/// Apply each ops file to `base` in order and render the result.
pub fn patch(base: &str, ops_files: &[&str]) -> Result<String, PatchError> {
    let mut doc: Value = serde_yaml::from_str(base).map_err(|e| PatchError::Parse(e.to_string()))?;
    for ops in ops_files {
        apply(&mut doc, &parse_ops(ops)?)?;
    }
    serde_yaml::to_string(&doc).map_err(|e| PatchError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
