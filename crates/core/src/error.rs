// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced to the user, each with a fixed exit code.

use thiserror::Error;

/// What went wrong reading or writing the state directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateIoKind {
    /// Another invocation holds the lock.
    Locked,
    Io,
    /// The document does not parse or is newer than this build.
    Corrupt,
}

#[derive(Debug, Error)]
pub enum BblError {
    #[error("{0}")]
    UserInput(String),

    #[error("invariant violated: {0}; run `bbl destroy` to clean up")]
    InvariantViolation(String),

    #[error("{tool} failed{}{}", exit_suffix(.exit_code), tail_suffix(.tail))]
    ExternalTool { tool: String, exit_code: Option<i32>, tail: String },

    #[error("cloud API error: {0}")]
    CloudApi(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    StateIo { kind: StateIoKind, message: String },

    #[error("interrupted")]
    Cancelled,
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {code}"),
        None => String::new(),
    }
}

fn tail_suffix(tail: &str) -> String {
    if tail.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{tail}")
    }
}

impl BblError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BblError::UserInput(_) => 1,
            BblError::InvariantViolation(_) => 3,
            BblError::ExternalTool { .. }
            | BblError::CloudApi(_)
            | BblError::Transport(_)
            | BblError::Cancelled => 2,
            BblError::StateIo { kind: StateIoKind::Corrupt, .. } => 3,
            BblError::StateIo { .. } => 1,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BblError::Cancelled)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
