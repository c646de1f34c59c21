// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud-config and runtime-config for a running director.

use std::fs;
use std::io;
use std::path::Path;

use bbl_adapters::{DirectorConnector, DirectorError, DirectorTarget};
use bbl_core::{BblError, Secret, State, StateIoKind};
use bbl_storage::StateStore;

use crate::deployer::jumpbox_private_key;
use crate::manifest::{self, Deployment};
use crate::{assets, iaas};

pub const CLOUD_CONFIG_DIR: &str = "cloud-config";
pub const CLOUD_CONFIG_FILE: &str = "cloud-config.yml";
/// Relative to the director deployment directory, and to the assets.
pub const RUNTIME_CONFIG: &str = "runtime-configs/dns.yml";

pub const CLOUD_CONFIG_NAME: &str = "default";
pub const RUNTIME_CONFIG_NAME: &str = "dns";

fn io_error(path: &Path, err: io::Error) -> BblError {
    BblError::StateIo { kind: StateIoKind::Io, message: format!("{}: {err}", path.display()) }
}

/// The cloud-config for the current provisioner outputs.
pub fn cloud_config(state: &State) -> Result<String, BblError> {
    let base = assets::require("cloud-config/cloud-config.yml")?;
    let ops = iaas::cloud_config_ops(state)?;
    manifest::render(base, &ops, &manifest::cloud_config_vars(state)?)
}

/// The runtime-config from the director deployment directory, seeded from
/// the embedded copy when absent. Local edits are kept.
pub fn runtime_config(store: &StateStore) -> Result<String, BblError> {
    let path = store.get_dir(Deployment::Director.dir())?.join(RUNTIME_CONFIG);
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&path, assets::require(RUNTIME_CONFIG)?).map_err(|e| io_error(&path, e))?;
    }
    fs::read_to_string(&path).map_err(|e| io_error(&path, e))
}

/// How to reach the director recorded in `state`.
pub fn director_target(state: &State) -> Result<DirectorTarget, BblError> {
    if !state.director.deployed || state.director.address.is_empty() {
        return Err(BblError::UserInput("no director has been deployed".into()));
    }
    let key = jumpbox_private_key(state)?.ok_or_else(|| {
        BblError::InvariantViolation("the jumpbox SSH key is missing from state".into())
    })?;
    Ok(DirectorTarget {
        address: state.director.address.clone(),
        username: state.director.username.clone(),
        password: state.director.password.clone(),
        ca_cert: state.director.ssl_ca.clone(),
        jumpbox_url: state.jumpbox.url.clone(),
        jumpbox_private_key: Secret::new(key),
    })
}

/// Talks to the director through `C`. The connection stays up until the
/// caller disconnects the connector.
#[derive(Clone)]
pub struct ConfigApplier<C> {
    connector: C,
}

impl<C: DirectorConnector> ConfigApplier<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Upload the cloud-config then the runtime-config.
    pub async fn apply(&self, store: &StateStore, state: &mut State) -> Result<(), BblError> {
        let cloud = cloud_config(state)?;
        let path = store.get_dir(CLOUD_CONFIG_DIR)?.join(CLOUD_CONFIG_FILE);
        fs::write(&path, &cloud).map_err(|e| io_error(&path, e))?;
        let runtime = runtime_config(store)?;
        let target = director_target(state)?;

        let director = self.connector.connect(&target).await?;
        director.update_config("cloud", CLOUD_CONFIG_NAME, &cloud).await?;
        director.update_config("runtime", RUNTIME_CONFIG_NAME, &runtime).await?;
        state.director.config_applied = true;
        tracing::info!(address = %target.address, "director configs applied");
        Ok(())
    }

    /// Names of the deployments the director still manages.
    pub async fn deployments(&self, target: &DirectorTarget) -> Result<Vec<String>, DirectorError> {
        let director = self.connector.connect(target).await?;
        director.deployments().await
    }

    pub async fn disconnect(&self) {
        self.connector.disconnect().await;
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
