// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of external tools.
//!
//! Output is streamed line by line into `tracing` after escape stripping
//! and secret redaction. The last [`TAIL_LINES`] redacted lines are kept
//! for error messages.

mod subprocess;

#[cfg(any(test, feature = "test-support"))]
mod fake;

use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;
use bbl_core::{strip_control, truncate_log_line, BblError, Redactor};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use subprocess::SubprocessRunner;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCall, FakeResponse, FakeRunner};

/// Lines of output kept for error reports.
pub const TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<RunnerError> for BblError {
    fn from(err: RunnerError) -> Self {
        let program = match &err {
            RunnerError::Spawn { program, .. } | RunnerError::Wait { program, .. } => program.clone(),
        };
        BblError::ExternalTool { tool: program, exit_code: None, tail: err.to_string() }
    }
}

/// One invocation of an external program.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    /// Label for log events (`terraform`, `bosh`, `ssh`).
    pub tool: String,
    pub redactor: Redactor,
    /// Collect stdout instead of logging it.
    pub capture_stdout: bool,
    /// Inherit the terminal; nothing is logged or captured.
    pub interactive: bool,
}

impl CommandSpec {
    pub fn new(tool: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: PathBuf::from("."),
            env: Vec::new(),
            tool: tool.into(),
            redactor: Redactor::default(),
            capture_stdout: false,
            interactive: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn envs(mut self, env: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Subcommand, i.e. the first argument.
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// `program args...` with secrets redacted, for log fields.
    pub fn display(&self) -> String {
        let line = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        self.redactor.redact(&line).into_owned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child died from a signal.
    pub exit_code: Option<i32>,
    /// Raw stdout, only when the command asked for capture.
    pub stdout: String,
    /// Last redacted output lines.
    pub tail: String,
    /// The run was cancelled and the child signalled.
    pub interrupted: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.interrupted
    }
}

/// Capability for running external executables.
#[async_trait]
pub trait Runner: Clone + Send + Sync + 'static {
    async fn run(
        &self,
        spec: CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunnerError>;
}

/// Ring buffer of the most recent output lines.
#[derive(Debug, Default)]
pub(crate) struct Tail {
    lines: VecDeque<String>,
}

impl Tail {
    pub(crate) fn push(&mut self, line: String) {
        if self.lines.len() == TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub(crate) fn render(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Strip, redact, truncate and log one line of child output. Returns the
/// line as logged. Terraform and bosh lines are emitted under their own
/// targets so `BBL_LOG=terraform=debug` style filters apply.
pub(crate) fn log_line(tool: &str, stream: &'static str, redactor: &Redactor, raw: &str) -> String {
    let clean = strip_control(raw);
    let line = truncate_log_line(redactor.redact(&clean).into_owned());
    if line.trim().is_empty() {
        return line;
    }
    match tool {
        "terraform" => tracing::info!(target: "terraform", stream, "{line}"),
        "bosh" => tracing::info!(target: "bosh", stream, "{line}"),
        _ => tracing::info!(tool, stream, "{line}"),
    }
    line
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
