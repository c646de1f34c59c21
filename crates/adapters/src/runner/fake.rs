// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stand-in for external executables.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::{log_line, CommandOutput, CommandSpec, Runner, RunnerError, Tail};

/// Recorded invocation
#[derive(Debug, Clone)]
pub struct FakeCall {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl FakeCall {
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Scripted result of a fake invocation.
#[derive(Debug, Clone, Default)]
pub struct FakeResponse {
    pub exit_code: i32,
    /// Returned as captured stdout.
    pub stdout: String,
    /// Lines "printed" by the fake; logged like real child output.
    pub output: Vec<String>,
}

impl FakeResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), ..Self::default() }
    }

    pub fn exit(exit_code: i32) -> Self {
        Self { exit_code, ..Self::default() }
    }

    pub fn with_output(mut self, line: impl Into<String>) -> Self {
        self.output.push(line.into());
        self
    }
}

type Handler = Arc<dyn Fn(&FakeCall) -> FakeResponse + Send + Sync>;

struct Route {
    program: String,
    subcommand: Option<String>,
    handler: Handler,
}

#[derive(Default)]
struct FakeRunnerState {
    calls: Vec<FakeCall>,
    routes: Vec<Route>,
}

/// Fake runner for testing.
///
/// Dispatches on `(program, first arg)`; the most recently registered
/// matching route wins. Unrouted calls succeed with no output.
#[derive(Clone, Default)]
pub struct FakeRunner {
    inner: Arc<Mutex<FakeRunnerState>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `program subcommand ...` to `handler`. A `None` subcommand
    /// matches any invocation of `program`.
    pub fn on<F>(&self, program: &str, subcommand: Option<&str>, handler: F) -> &Self
    where
        F: Fn(&FakeCall) -> FakeResponse + Send + Sync + 'static,
    {
        self.inner.lock().routes.push(Route {
            program: program.to_string(),
            subcommand: subcommand.map(str::to_string),
            handler: Arc::new(handler),
        });
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.lock().calls.clone()
    }

    /// Calls of `program` with the given first argument.
    pub fn calls_to(&self, program: &str, subcommand: &str) -> Vec<FakeCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.program == program && c.subcommand() == Some(subcommand))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    fn route(&self, call: &FakeCall) -> Option<Handler> {
        let state = self.inner.lock();
        state
            .routes
            .iter()
            .rev()
            .find(|r| {
                r.program == call.program
                    && r.subcommand.as_deref().is_none_or(|s| call.subcommand() == Some(s))
            })
            .map(|r| Arc::clone(&r.handler))
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(
        &self,
        spec: CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunnerError> {
        let call = FakeCall {
            program: spec.program.clone(),
            args: spec.args.clone(),
            cwd: spec.cwd.clone(),
            env: spec.env.clone(),
        };
        self.inner.lock().calls.push(call.clone());

        // Handler runs outside the lock so it may inspect the fake.
        let response = match self.route(&call) {
            Some(handler) => handler(&call),
            None => FakeResponse::ok(),
        };

        let mut tail = Tail::default();
        for raw in &response.output {
            tail.push(log_line(&spec.tool, "stdout", &spec.redactor, raw));
        }

        let interrupted = cancel.is_cancelled();
        Ok(CommandOutput {
            exit_code: Some(response.exit_code),
            stdout: if spec.capture_stdout { response.stdout } else { String::new() },
            tail: tail.render(),
            interrupted,
        })
    }
}
