// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bosh create-env` / `delete-env` driver.

use std::fs;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use bbl_core::{BblError, Redactor, StateIoKind};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::runner::{CommandSpec, Runner, RunnerError};

pub const MANIFEST_FILE: &str = "manifest.yml";
pub const STATE_FILE: &str = "state.json";
pub const VARS_STORE_FILE: &str = "vars-store.yml";
pub const VARS_FILE: &str = "vars-file.yml";

const TOOL: &str = "bosh";

#[derive(Debug, Error)]
pub enum BoshError {
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error("bosh {command} failed")]
    Failed { command: &'static str, exit_code: Option<i32>, tail: String },
    #[error("bosh {command} interrupted")]
    Interrupted { command: &'static str },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<BoshError> for BblError {
    fn from(err: BoshError) -> Self {
        match err {
            BoshError::Failed { command, exit_code, tail } => {
                BblError::ExternalTool { tool: format!("{TOOL} {command}"), exit_code, tail }
            }
            BoshError::Interrupted { .. } => BblError::Cancelled,
            BoshError::Runner(_) => {
                BblError::ExternalTool { tool: TOOL.to_string(), exit_code: None, tail: err.to_string() }
            }
            BoshError::Io { .. } => {
                BblError::StateIo { kind: StateIoKind::Io, message: err.to_string() }
            }
        }
    }
}

/// A deployment directory (`jumpbox-deployment/` or `bosh-deployment/`).
#[derive(Debug, Clone)]
pub struct BoshWorkspace {
    pub dir: PathBuf,
    /// Secret variables file passed with `-l`; removed after every run.
    pub secrets_file: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub redactor: Redactor,
}

/// What `bosh` left behind after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentArtifacts {
    pub state: Option<String>,
    pub vars_store: Option<String>,
}

impl BoshWorkspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), secrets_file: None, env: Vec::new(), redactor: Redactor::default() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Materialize inputs. `state` and `vars_store` are skipped when empty
    /// so `bosh` starts fresh.
    pub fn write_inputs(
        &self,
        manifest: &str,
        vars_file: &str,
        vars_store: &str,
        state: &str,
    ) -> Result<(), BoshError> {
        write_file(&self.path(MANIFEST_FILE), manifest, 0o644)?;
        write_file(&self.path(VARS_FILE), vars_file, 0o644)?;
        if !vars_store.is_empty() {
            write_file(&self.path(VARS_STORE_FILE), vars_store, 0o600)?;
        }
        if !state.is_empty() {
            write_file(&self.path(STATE_FILE), state, 0o600)?;
        }
        Ok(())
    }

    pub fn write_secrets(&self, contents: &str) -> Result<(), BoshError> {
        match &self.secrets_file {
            Some(path) => write_file(path, contents, 0o600),
            None => Ok(()),
        }
    }

    /// Read back `state.json` and `vars-store.yml`, whichever exist.
    pub fn read_artifacts(&self) -> Result<DeploymentArtifacts, BoshError> {
        Ok(DeploymentArtifacts {
            state: read_optional(&self.path(STATE_FILE))?,
            vars_store: read_optional(&self.path(VARS_STORE_FILE))?,
        })
    }

    fn remove_secrets(&self) {
        if let Some(path) = &self.secrets_file {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove secrets file");
                }
            }
        }
    }
}

fn write_file(path: &Path, contents: &str, mode: u32) -> Result<(), BoshError> {
    use std::io::Write;
    let io_err = |source| BoshError::Io { path: path.to_path_buf(), source };
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
        .map_err(io_err)?;
    file.write_all(contents.as_bytes()).map_err(io_err)
}

fn read_optional(path: &Path) -> Result<Option<String>, BoshError> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(BoshError::Io { path: path.to_path_buf(), source }),
    }
}

#[derive(Debug, Clone)]
pub struct BoshCli<R> {
    runner: R,
    binary: String,
}

impl<R: Runner> BoshCli<R> {
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        Self { runner, binary: binary.into() }
    }

    pub async fn create_env(
        &self,
        ws: &BoshWorkspace,
        cancel: &CancellationToken,
    ) -> Result<(), BoshError> {
        self.run("create-env", ws, cancel).await
    }

    pub async fn delete_env(
        &self,
        ws: &BoshWorkspace,
        cancel: &CancellationToken,
    ) -> Result<(), BoshError> {
        self.run("delete-env", ws, cancel).await
    }

    async fn run(
        &self,
        command: &'static str,
        ws: &BoshWorkspace,
        cancel: &CancellationToken,
    ) -> Result<(), BoshError> {
        let mut args = vec![
            command.to_string(),
            ws.path(MANIFEST_FILE).display().to_string(),
            "--state".to_string(),
            ws.path(STATE_FILE).display().to_string(),
            "--vars-store".to_string(),
            ws.path(VARS_STORE_FILE).display().to_string(),
            "--vars-file".to_string(),
            ws.path(VARS_FILE).display().to_string(),
        ];
        if let Some(secrets) = &ws.secrets_file {
            args.push("-l".to_string());
            args.push(secrets.display().to_string());
        }

        let spec = CommandSpec::new(TOOL, &self.binary)
            .args(args)
            .cwd(&ws.dir)
            .envs(ws.env.iter().cloned())
            .redactor(ws.redactor.clone());
        let result = self.runner.run(spec, cancel).await;
        ws.remove_secrets();

        let out = result?;
        if out.interrupted {
            return Err(BoshError::Interrupted { command });
        }
        if !out.success() {
            return Err(BoshError::Failed { command, exit_code: out.exit_code, tail: out.tail });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "bosh_tests.rs"]
mod tests;
