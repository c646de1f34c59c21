// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bosh create-env` / `delete-env` for the jumpbox and the director.
//!
//! A deployment whose manifest, variables and vars-store hash to the value
//! recorded by its last successful run is skipped. Whatever `bosh` leaves
//! in `state.json` and the vars-store is copied back into [`State`] after
//! every run, failed ones included.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use bbl_adapters::{BoshCli, BoshWorkspace, Runner};
use bbl_core::{BblError, Redactor, Secret, State, StateIoKind};
use bbl_storage::StateStore;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::assets;
use crate::manifest::{self, Deployment, DeploymentInputs};

pub const VARS_DIR: &str = "vars";
pub const JUMPBOX_KEY_FILE: &str = "jumpbox.key";
pub const DIRECTOR_PORT: u16 = 25555;
pub const DIRECTOR_USERNAME: &str = "admin";

fn io_error(path: &Path, err: std::io::Error) -> BblError {
    BblError::StateIo { kind: StateIoKind::Io, message: format!("{}: {err}", path.display()) }
}

/// Hash identifying one set of deployment inputs.
pub fn deployment_hash(inputs: &DeploymentInputs, vars_store: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [&inputs.manifest, &inputs.vars_file, &inputs.secrets, vars_store] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn corrupt_vars(err: serde_yaml::Error) -> BblError {
    BblError::StateIo {
        kind: StateIoKind::Corrupt,
        message: format!("deployment variables are not valid YAML: {err}"),
    }
}

/// A string leaf of a vars-store document, e.g. `["director_ssl", "ca"]`.
pub fn vars_store_value(vars_store: &str, path: &[&str]) -> Result<Option<String>, BblError> {
    if vars_store.trim().is_empty() {
        return Ok(None);
    }
    let doc: serde_yaml::Value = serde_yaml::from_str(vars_store).map_err(corrupt_vars)?;
    let mut node = &doc;
    for key in path {
        match node.get(*key) {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }
    Ok(node.as_str().map(str::to_string))
}

/// `vars_store` without the top-level `key`, so the next run regenerates it.
pub fn drop_vars_store_key(vars_store: &str, key: &str) -> Result<String, BblError> {
    if vars_store.trim().is_empty() {
        return Ok(String::new());
    }
    let mut doc: serde_yaml::Mapping = serde_yaml::from_str(vars_store).map_err(corrupt_vars)?;
    if doc.remove(key).is_none() {
        return Ok(vars_store.to_string());
    }
    serde_yaml::to_string(&doc)
        .map_err(|e| BblError::InvariantViolation(format!("failed to encode YAML: {e}")))
}

/// Private half of the `jumpbox` user's SSH key, once the jumpbox exists.
pub fn jumpbox_private_key(state: &State) -> Result<Option<String>, BblError> {
    vars_store_value(state.jumpbox.variables.expose(), &["jumpbox_ssh", "private_key"])
}

/// Write a private key as `vars/<name>`, mode 0600.
pub fn write_key(store: &StateStore, name: &str, key: &str) -> Result<PathBuf, BblError> {
    let path = store.get_dir(VARS_DIR)?.join(name);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)
        .map_err(|e| io_error(&path, e))?;
    file.write_all(key.as_bytes()).map_err(|e| io_error(&path, e))?;
    Ok(path)
}

pub fn write_jumpbox_key(store: &StateStore, key: &str) -> Result<PathBuf, BblError> {
    write_key(store, JUMPBOX_KEY_FILE, key)
}

/// `BOSH_ALL_PROXY` value tunnelling through the jumpbox.
pub fn all_proxy(jumpbox_url: &str, key_path: &Path) -> String {
    format!("ssh+socks5://jumpbox@{jumpbox_url}?private-key={}", key_path.display())
}

/// The per-deployment fields of [`State`].
struct Slot<'a> {
    manifest: &'a mut String,
    state: &'a mut String,
    variables: &'a mut Secret,
    deployed: &'a mut bool,
    deployed_hash: &'a mut String,
}

fn slot_of(state: &mut State, deployment: Deployment) -> Slot<'_> {
    match deployment {
        Deployment::Jumpbox => Slot {
            manifest: &mut state.jumpbox.manifest,
            state: &mut state.jumpbox.state,
            variables: &mut state.jumpbox.variables,
            deployed: &mut state.jumpbox.enabled,
            deployed_hash: &mut state.jumpbox.deployed_hash,
        },
        Deployment::Director => Slot {
            manifest: &mut state.director.manifest,
            state: &mut state.director.state,
            variables: &mut state.director.variables,
            deployed: &mut state.director.deployed,
            deployed_hash: &mut state.director.deployed_hash,
        },
    }
}

#[derive(Debug, Clone)]
pub struct Deployer<R> {
    bosh: BoshCli<R>,
}

impl<R: Runner> Deployer<R> {
    pub fn new(bosh: BoshCli<R>) -> Self {
        Self { bosh }
    }

    pub async fn create_jumpbox(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        if !self.create(store, state, Deployment::Jumpbox, cancel).await? {
            return Ok(false);
        }
        let external_ip = state.output_str("external_ip").ok_or_else(|| {
            BblError::InvariantViolation("provisioner outputs are missing external_ip".into())
        })?;
        let url = format!("{external_ip}:22");
        state.jumpbox.url = url;
        Ok(true)
    }

    pub async fn create_director(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        if !self.create(store, state, Deployment::Director, cancel).await? {
            return Ok(false);
        }
        let ip = state.output_str("director__internal_ip").ok_or_else(|| {
            BblError::InvariantViolation("provisioner outputs are missing director__internal_ip".into())
        })?;
        let address = format!("https://{ip}:{DIRECTOR_PORT}");
        let variables = state.director.variables.expose();
        let password = vars_store_value(variables, &["admin_password"])?.unwrap_or_default();
        let ssl_ca = vars_store_value(variables, &["director_ssl", "ca"])?.unwrap_or_default();

        let director = &mut state.director;
        director.address = address;
        director.username = DIRECTOR_USERNAME.to_string();
        director.password = Secret::new(password);
        director.ssl_ca = ssl_ca;
        Ok(true)
    }

    pub async fn delete_director(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        if !self.delete(store, state, Deployment::Director, cancel).await? {
            return Ok(false);
        }
        let director = &mut state.director;
        director.address.clear();
        director.username.clear();
        director.password = Secret::default();
        director.ssl_ca.clear();
        director.config_applied = false;
        Ok(true)
    }

    pub async fn delete_jumpbox(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        if !self.delete(store, state, Deployment::Jumpbox, cancel).await? {
            return Ok(false);
        }
        state.jumpbox.url.clear();
        Ok(true)
    }

    fn workspace(
        &self,
        store: &StateStore,
        state: &State,
        deployment: Deployment,
        inputs: &DeploymentInputs,
    ) -> Result<BoshWorkspace, BblError> {
        let dir = store.get_dir(deployment.dir())?;
        assets::materialize(deployment.dir(), &dir).map_err(|e| io_error(&dir, e))?;

        let mut ws = BoshWorkspace::new(dir);
        ws.redactor = Redactor::from_state(state);
        if !inputs.secrets.is_empty() {
            let name = format!("{}-secrets.yml", deployment.name());
            ws.secrets_file = Some(store.get_dir(VARS_DIR)?.join(name));
        }
        if deployment == Deployment::Director {
            if let Some(key) = jumpbox_private_key(state)? {
                let key_path = write_jumpbox_key(store, &key)?;
                ws.env.push(("BOSH_ALL_PROXY".into(), all_proxy(&state.jumpbox.url, &key_path)));
            }
        }
        Ok(ws)
    }

    /// Copy what `bosh` left behind into `slot`.
    fn read_back(ws: &BoshWorkspace, slot: &mut Slot<'_>) -> Result<(), BblError> {
        let artifacts = ws.read_artifacts()?;
        if let Some(bosh_state) = artifacts.state {
            *slot.state = bosh_state;
        }
        if let Some(vars_store) = artifacts.vars_store {
            *slot.variables = Secret::new(vars_store);
        }
        Ok(())
    }

    async fn create(
        &self,
        store: &StateStore,
        state: &mut State,
        deployment: Deployment,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        let inputs = manifest::build(state, deployment)?;
        let ws = self.workspace(store, state, deployment, &inputs)?;

        let mut slot = slot_of(state, deployment);
        let hash = deployment_hash(&inputs, slot.variables.expose());
        if *slot.deployed && *slot.deployed_hash == hash {
            tracing::info!(%deployment, "No new changes, skipping deployment.");
            return Ok(false);
        }

        ws.write_inputs(
            &inputs.manifest,
            &inputs.vars_file,
            slot.variables.expose(),
            slot.state.as_str(),
        )?;
        ws.write_secrets(&inputs.secrets)?;
        slot.deployed_hash.clear();
        *slot.manifest = inputs.manifest.clone();

        tracing::info!(%deployment, "bosh create-env");
        let result = self.bosh.create_env(&ws, cancel).await;
        let read_back = Self::read_back(&ws, &mut slot);
        result?;
        read_back?;

        *slot.deployed = true;
        *slot.deployed_hash = deployment_hash(&inputs, slot.variables.expose());
        tracing::info!(%deployment, "deployment complete");
        Ok(true)
    }

    async fn delete(
        &self,
        store: &StateStore,
        state: &mut State,
        deployment: Deployment,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        {
            let slot = slot_of(state, deployment);
            if !*slot.deployed && slot.state.is_empty() {
                tracing::info!(%deployment, "nothing deployed, skipping delete");
                return Ok(false);
            }
        }
        let inputs = manifest::build(state, deployment)?;
        let ws = self.workspace(store, state, deployment, &inputs)?;

        let mut slot = slot_of(state, deployment);
        ws.write_inputs(
            &inputs.manifest,
            &inputs.vars_file,
            slot.variables.expose(),
            slot.state.as_str(),
        )?;
        ws.write_secrets(&inputs.secrets)?;
        slot.deployed_hash.clear();

        tracing::info!(%deployment, "bosh delete-env");
        let result = self.bosh.delete_env(&ws, cancel).await;
        let read_back = Self::read_back(&ws, &mut slot);
        result?;
        read_back?;

        slot.manifest.clear();
        slot.state.clear();
        *slot.variables = Secret::default();
        *slot.deployed = false;
        for file in [bbl_adapters::bosh::STATE_FILE, bbl_adapters::bosh::VARS_STORE_FILE] {
            let path = ws.path(file);
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(io_error(&path, e));
                }
            }
        }
        tracing::info!(%deployment, "deployment deleted");
        Ok(true)
    }
}

#[cfg(test)]
#[path = "deployer_tests.rs"]
mod tests;
