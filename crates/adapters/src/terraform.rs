// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terraform driver.
//!
//! Mechanics only: workspace files, command lines, version negotiation and
//! output parsing. Deciding when to apply lives in the engine.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bbl_core::{BblError, Redactor, StateIoKind};
use indexmap::IndexMap;
use semver::Version;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::runner::{CommandSpec, Runner, RunnerError};

pub const TEMPLATE_FILE: &str = "template.tf";
pub const VARS_FILE: &str = "vars.tfvars";
pub const STATE_FILE: &str = "terraform.tfstate";

/// Oldest supported release.
pub const MIN_VERSION: Version = Version::new(0, 11, 0);
/// First release not yet supported.
pub const MAX_VERSION_EXCLUSIVE: Version = Version::new(2, 0, 0);

const TOOL: &str = "terraform";

#[derive(Debug, Error)]
pub enum TerraformError {
    #[error(transparent)]
    Runner(#[from] RunnerError),
    #[error("terraform {command} failed")]
    Failed { command: &'static str, exit_code: Option<i32>, tail: String },
    #[error("terraform {command} interrupted")]
    Interrupted { command: &'static str },
    #[error(
        "terraform {found} is not supported; use a version >= {MIN_VERSION} and < {MAX_VERSION_EXCLUSIVE}"
    )]
    UnsupportedProvisionerVersion { found: Version },
    #[error("could not determine terraform version from {0:?}")]
    VersionParse(String),
    #[error("could not parse terraform outputs: {0}")]
    Outputs(String),
    #[error("could not render terraform variables: {0}")]
    Vars(String),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<TerraformError> for BblError {
    fn from(err: TerraformError) -> Self {
        match err {
            TerraformError::Failed { command, exit_code, tail } => {
                BblError::ExternalTool { tool: format!("{TOOL} {command}"), exit_code, tail }
            }
            TerraformError::Interrupted { .. } => BblError::Cancelled,
            TerraformError::UnsupportedProvisionerVersion { .. }
            | TerraformError::VersionParse(_)
            | TerraformError::Vars(_) => BblError::UserInput(err.to_string()),
            TerraformError::Runner(_) | TerraformError::Outputs(_) => {
                BblError::ExternalTool { tool: TOOL.to_string(), exit_code: None, tail: err.to_string() }
            }
            TerraformError::Io { .. } => {
                BblError::StateIo { kind: StateIoKind::Io, message: err.to_string() }
            }
        }
    }
}

/// Working directory plus per-run environment.
#[derive(Debug, Clone)]
pub struct TfWorkspace {
    pub dir: PathBuf,
    /// `TF_VAR_*` credentials; never written to disk.
    pub env: Vec<(String, String)>,
    pub redactor: Redactor,
}

impl TfWorkspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), env: Vec::new(), redactor: Redactor::default() }
    }

    /// Write template, variables and (when non-empty) the stored state blob.
    pub fn write_inputs(
        &self,
        template: &str,
        vars: &IndexMap<String, Value>,
        tf_state: &str,
    ) -> Result<(), TerraformError> {
        write_file(&self.dir.join(TEMPLATE_FILE), template)?;
        write_file(&self.dir.join(VARS_FILE), &render_vars(vars)?)?;
        if !tf_state.is_empty() {
            write_file(&self.dir.join(STATE_FILE), tf_state)?;
        }
        Ok(())
    }

    /// Contents of `terraform.tfstate`, empty if terraform never wrote one.
    pub fn read_state(&self) -> Result<String, TerraformError> {
        let path = self.dir.join(STATE_FILE);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(TerraformError::Io { path, source }),
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), TerraformError> {
    fs::write(path, contents).map_err(|source| TerraformError::Io { path: path.to_path_buf(), source })
}

/// Render variables as an HCL attribute body, in insertion order.
pub fn render_vars(vars: &IndexMap<String, Value>) -> Result<String, TerraformError> {
    hcl::to_string(vars).map_err(|e| TerraformError::Vars(e.to_string()))
}

/// Credentials as `TF_VAR_<name>` environment variables.
pub fn credential_env(credentials: &IndexMap<String, String>) -> Vec<(String, String)> {
    credentials.iter().map(|(k, v)| (format!("TF_VAR_{k}"), v.clone())).collect()
}

#[derive(Debug, Clone)]
pub struct Terraform<R> {
    runner: R,
    binary: String,
}

impl<R: Runner> Terraform<R> {
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        Self { runner, binary: binary.into() }
    }

    fn command(&self, ws: &TfWorkspace) -> CommandSpec {
        CommandSpec::new(TOOL, &self.binary)
            .cwd(&ws.dir)
            .envs(ws.env.iter().cloned())
            .redactor(ws.redactor.clone())
    }

    async fn checked(
        &self,
        command: &'static str,
        spec: CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<String, TerraformError> {
        let out = self.runner.run(spec, cancel).await?;
        if out.interrupted {
            return Err(TerraformError::Interrupted { command });
        }
        if !out.success() {
            return Err(TerraformError::Failed { command, exit_code: out.exit_code, tail: out.tail });
        }
        Ok(out.stdout)
    }

    /// Installed version, rejected when outside the supported range.
    pub async fn version(
        &self,
        ws: &TfWorkspace,
        cancel: &CancellationToken,
    ) -> Result<Version, TerraformError> {
        let spec = self.command(ws).args(["version", "-json"]).capture_stdout();
        let stdout = self.checked("version", spec, cancel).await?;
        let version = parse_version(&stdout)?;
        check_version(&version)?;
        tracing::debug!(%version, "terraform version");
        Ok(version)
    }

    pub async fn init(&self, ws: &TfWorkspace, cancel: &CancellationToken) -> Result<(), TerraformError> {
        let spec = self.command(ws).args(["init", "-input=false", "-no-color"]);
        self.checked("init", spec, cancel).await.map(drop)
    }

    pub async fn apply(&self, ws: &TfWorkspace, cancel: &CancellationToken) -> Result<(), TerraformError> {
        let spec = self.command(ws).args(["apply"]).args(run_flags());
        self.checked("apply", spec, cancel).await.map(drop)
    }

    pub async fn destroy(&self, ws: &TfWorkspace, cancel: &CancellationToken) -> Result<(), TerraformError> {
        let spec = self.command(ws).args(["destroy"]).args(run_flags());
        self.checked("destroy", spec, cancel).await.map(drop)
    }

    /// All outputs of the current state, unwrapped from terraform's
    /// `{name: {value, type, sensitive}}` shape.
    pub async fn outputs(
        &self,
        ws: &TfWorkspace,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, Value>, TerraformError> {
        let spec =
            self.command(ws).args(["output", "-json", &format!("-state={STATE_FILE}")]).capture_stdout();
        let stdout = self.checked("output", spec, cancel).await?;
        parse_outputs(&stdout)
    }
}

fn run_flags() -> [String; 5] {
    [
        "-auto-approve".to_string(),
        "-no-color".to_string(),
        "-input=false".to_string(),
        format!("-var-file={VARS_FILE}"),
        format!("-state={STATE_FILE}"),
    ]
}

/// Accepts `terraform version -json` output, falling back to the text
/// banner (`Terraform v0.11.14`) of releases without `-json`.
pub fn parse_version(stdout: &str) -> Result<Version, TerraformError> {
    if let Ok(json) = serde_json::from_str::<Value>(stdout) {
        if let Some(v) = json.get("terraform_version").and_then(Value::as_str) {
            return Version::parse(v).map_err(|_| TerraformError::VersionParse(v.to_string()));
        }
    }
    let first = stdout.lines().next().unwrap_or_default().trim();
    let raw = first.strip_prefix("Terraform v").unwrap_or(first);
    let raw = raw.split_whitespace().next().unwrap_or_default();
    Version::parse(raw).map_err(|_| TerraformError::VersionParse(first.to_string()))
}

pub fn check_version(version: &Version) -> Result<(), TerraformError> {
    // Compare release numbers only; a pre-release of a supported line is fine.
    let release = Version::new(version.major, version.minor, version.patch);
    if release < MIN_VERSION || release >= MAX_VERSION_EXCLUSIVE {
        return Err(TerraformError::UnsupportedProvisionerVersion { found: version.clone() });
    }
    Ok(())
}

pub fn parse_outputs(stdout: &str) -> Result<BTreeMap<String, Value>, TerraformError> {
    if stdout.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, Value> =
        serde_json::from_str(stdout).map_err(|e| TerraformError::Outputs(e.to_string()))?;
    Ok(raw
        .into_iter()
        .map(|(name, output)| {
            let value = match output {
                Value::Object(mut obj) if obj.contains_key("value") => {
                    obj.remove("value").unwrap_or(Value::Null)
                }
                other => other,
            };
            (name, value)
        })
        .collect())
}

#[cfg(test)]
#[path = "terraform_tests.rs"]
mod tests;
