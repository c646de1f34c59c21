// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log hygiene for child-process output and error tails.
//!
//! Child output goes through [`strip_control`], then [`Redactor::redact`],
//! then [`truncate_log_line`]. Redaction sees the whole line, so a secret
//! is never cut in half by the length limit.

use std::borrow::Cow;

use crate::State;

pub const REDACTED: &str = "[REDACTED]";

/// Floor for values guessed from variable stores and for single lines of
/// multi-line secrets. Known credentials are redacted at any length.
const MIN_GUESSED_LEN: usize = 6;

const MAX_LOG_CHARS: usize = 4096;

/// Replaces known secret values in log lines.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    /// Longest first, so a secret containing another is replaced whole.
    secrets: Vec<String>,
}

impl Redactor {
    /// Every non-empty value is redacted, however short.
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::default().extend(secrets, 1)
    }

    fn extend<I, S>(mut self, secrets: I, min_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = std::mem::take(&mut self.secrets);
        for secret in secrets {
            let secret = secret.as_ref().trim();
            if !secret.is_empty() && secret.len() >= min_len {
                out.push(secret.to_string());
            }
            // Multi-line values (keys, certs) reach the log one line at a time.
            if secret.contains('\n') {
                for line in secret.lines().map(str::trim) {
                    if line.len() >= MIN_GUESSED_LEN {
                        out.push(line.to_string());
                    }
                }
            }
        }
        out.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        out.dedup();
        Self { secrets: out }
    }

    /// Every secret the state carries: credentials, director password,
    /// private keys and every leaf of the deployer variable stores.
    pub fn from_state(state: &State) -> Self {
        let mut known: Vec<String> = Vec::new();
        if let Some(creds) = &state.iaas_credentials {
            known.extend(creds.secrets().into_iter().map(str::to_string));
        }
        known.push(state.director.password.expose().to_string());
        known.push(state.key_pair.private_key.expose().to_string());
        known.push(state.lb.key.expose().to_string());

        let mut leaves: Vec<String> = Vec::new();
        for vars in [&state.director.variables, &state.jumpbox.variables] {
            collect_yaml_leaves(vars.expose(), &mut leaves);
        }
        Self::new(known).extend(leaves, MIN_GUESSED_LEN)
    }

    /// Add more known values, e.g. credentials supplied on this invocation only.
    pub fn with<S: AsRef<str>>(self, extra: impl IntoIterator<Item = S>) -> Self {
        self.extend(extra, 1)
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn redact<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(line);
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = Cow::Owned(out.replace(secret.as_str(), REDACTED));
            }
        }
        out
    }
}

fn collect_yaml_leaves(doc: &str, out: &mut Vec<String>) {
    if doc.trim().is_empty() {
        return;
    }
    let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(doc) else {
        return;
    };
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            serde_yaml::Value::String(s) => out.push(s),
            serde_yaml::Value::Sequence(seq) => stack.extend(seq),
            serde_yaml::Value::Mapping(map) => stack.extend(map.into_iter().map(|(_, v)| v)),
            serde_yaml::Value::Tagged(tagged) => stack.push(tagged.value),
            _ => {}
        }
    }
}

enum EscapeMode {
    Esc,
    Csi,
    Osc,
    OscEsc,
}

/// Strip terminal escape sequences and control characters from one line.
pub fn strip_control(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut esc_mode: Option<EscapeMode> = None;

    for c in input.chars() {
        if let Some(mode) = esc_mode.as_ref() {
            esc_mode = match mode {
                EscapeMode::Esc => match c {
                    '[' => Some(EscapeMode::Csi),
                    ']' => Some(EscapeMode::Osc),
                    _ => None,
                },
                EscapeMode::Csi if ('@'..='~').contains(&c) => None,
                EscapeMode::Csi => Some(EscapeMode::Csi),
                EscapeMode::Osc if c == '\x07' => None,
                EscapeMode::Osc if c == '\x1b' => Some(EscapeMode::OscEsc),
                EscapeMode::Osc => Some(EscapeMode::Osc),
                EscapeMode::OscEsc if c == '\\' => None,
                EscapeMode::OscEsc => Some(EscapeMode::Osc),
            };
            continue;
        }

        match c {
            '\x1b' => esc_mode = Some(EscapeMode::Esc),
            '\r' | '\n' => {}
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }

    out
}

/// Cap a line at [`MAX_LOG_CHARS`] characters.
pub fn truncate_log_line(mut line: String) -> String {
    if let Some((cut, _)) = line.char_indices().nth(MAX_LOG_CHARS) {
        line.truncate(cut);
        line.push_str(" ...[truncated]");
    }
    line
}

#[cfg(test)]
#[path = "redact_tests.rs"]
mod tests;
