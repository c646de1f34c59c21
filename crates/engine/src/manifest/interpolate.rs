// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `((name))` placeholder resolution.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// `((name))`, `((name.field))`, `((/absolute/name))`, `((!name))`
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\(\s*!?([-/\.\w]+)\s*\)\)").expect("constant regex pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpolateError {
    #[error("undefined variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("variable {0} is not a scalar and cannot be embedded in a string")]
    NotScalar(String),
}

/// Resolve a dotted name against `vars`.
fn lookup<'a>(vars: &'a Mapping, name: &str) -> Option<&'a Value> {
    let mut parts = name.split('.');
    let mut current = vars.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A string that is exactly one placeholder takes the variable's value
/// with its type; placeholders embedded in text are substituted as text.
fn substitute(
    s: &str,
    vars: &Mapping,
    missing: &mut BTreeSet<String>,
) -> Result<Option<Value>, InterpolateError> {
    let trimmed = s.trim();
    if let Some(caps) = VAR_PATTERN.captures(trimmed) {
        if caps.get(0).is_some_and(|m| m.start() == 0 && m.end() == trimmed.len()) {
            let name = &caps[1];
            return Ok(match lookup(vars, name) {
                Some(value) => Some(value.clone()),
                None => {
                    missing.insert(name.to_string());
                    None
                }
            });
        }
    } else {
        return Ok(None);
    }

    let mut not_scalar = None;
    let replaced = VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let name = &caps[1];
        match lookup(vars, name).map(scalar) {
            Some(Some(text)) => text,
            Some(None) => {
                not_scalar.get_or_insert_with(|| name.to_string());
                caps[0].to_string()
            }
            None => {
                missing.insert(name.to_string());
                caps[0].to_string()
            }
        }
    });
    if let Some(name) = not_scalar {
        return Err(InterpolateError::NotScalar(name));
    }
    Ok(Some(Value::String(replaced.into_owned())))
}

fn walk(node: &mut Value, vars: &Mapping, missing: &mut BTreeSet<String>) -> Result<(), InterpolateError> {
    match node {
        Value::String(s) => {
            if let Some(value) = substitute(s, vars, missing)? {
                *node = value;
            }
        }
        Value::Sequence(items) => {
            for item in items {
                walk(item, vars, missing)?;
            }
        }
        Value::Mapping(map) => {
            for (mut key, mut value) in std::mem::take(map) {
                walk(&mut key, vars, missing)?;
                walk(&mut value, vars, missing)?;
                map.insert(key, value);
            }
        }
        Value::Tagged(tagged) => walk(&mut tagged.value, vars, missing)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

/// Replace every placeholder in `doc`. Fails listing all undefined names.
pub fn interpolate(doc: &mut Value, vars: &Mapping) -> Result<(), InterpolateError> {
    let mut missing = BTreeSet::new();
    walk(doc, vars, &mut missing)?;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(InterpolateError::Missing(missing.into_iter().collect()))
    }
}

#[cfg(test)]
#[path = "interpolate_tests.rs"]
mod tests;
