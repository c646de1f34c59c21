// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use super::{log_line, CommandOutput, CommandSpec, Runner, RunnerError, Tail};

/// How long a child gets to exit after SIGINT before it is killed.
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// Spawns real processes with `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for SubprocessRunner {
    async fn run(
        &self,
        spec: CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, RunnerError> {
        let started = Instant::now();
        tracing::debug!(tool = %spec.tool, command = %spec.display(), cwd = %spec.cwd.display(), "running");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).envs(spec.env.iter().cloned());
        if !spec.cwd.as_os_str().is_empty() {
            cmd.current_dir(&spec.cwd);
        }
        if spec.interactive {
            cmd.stdin(Stdio::inherit()).stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            // Own process group, so a terminal Ctrl-C reaches the child only
            // through the forwarded SIGINT below.
            cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).process_group(0);
        }

        let mut child = cmd
            .spawn()
            .map_err(|source| RunnerError::Spawn { program: spec.program.clone(), source })?;

        let tail = Arc::new(Mutex::new(Tail::default()));
        let stdout_task = child.stdout.take().map(|out| {
            if spec.capture_stdout {
                tokio::spawn(capture(out))
            } else {
                tokio::spawn(stream(out, "stdout", spec.clone(), Arc::clone(&tail)))
            }
        });
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(stream(err, "stderr", spec.clone(), Arc::clone(&tail))));

        let mut waited = None;
        tokio::select! {
            status = child.wait() => waited = Some(status),
            _ = cancel.cancelled() => {}
        }
        let interrupted = waited.is_none();
        let status = match waited {
            Some(status) => status,
            None => interrupt(&mut child, &spec.tool).await,
        };
        let status =
            status.map_err(|source| RunnerError::Wait { program: spec.program.clone(), source })?;

        let mut stdout = String::new();
        if let Some(task) = stdout_task {
            stdout = task.await.unwrap_or_default();
        }
        if let Some(task) = stderr_task {
            let _ = task.await;
        }

        let exit_code = status.code();
        tracing::debug!(
            tool = %spec.tool,
            exit_code = ?exit_code,
            interrupted,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished"
        );
        let tail = tail.lock().render();
        Ok(CommandOutput { exit_code, stdout, tail, interrupted })
    }
}

/// Forward SIGINT, wait out the grace period, then kill.
async fn interrupt(child: &mut Child, tool: &str) -> std::io::Result<ExitStatus> {
    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        tracing::warn!(tool, pid, "interrupt received, forwarding SIGINT");
        if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGINT) {
            tracing::warn!(tool, error = %e, "failed to signal child");
        }
    }
    match tokio::time::timeout(INTERRUPT_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            tracing::warn!(tool, "child ignored SIGINT, killing");
            child.kill().await?;
            child.wait().await
        }
    }
}

async fn stream<R>(reader: R, name: &'static str, spec: CommandSpec, tail: Arc<Mutex<Tail>>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let raw = String::from_utf8_lossy(&buf);
                let line = log_line(&spec.tool, name, &spec.redactor, &raw);
                tail.lock().push(line);
            }
            Err(e) => {
                // Keep the pipe drained so the child never sees SIGPIPE.
                tracing::debug!(tool = %spec.tool, stream = name, error = %e, "output unreadable, discarding");
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                break;
            }
        }
    }
    String::new()
}

async fn capture<R>(reader: R) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut reader = reader;
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
