// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! When to run terraform, and what to keep afterwards.
//!
//! The state blob is read back after every run, failed or interrupted
//! ones included, so resources from a partial apply are never orphaned.
//! Persisting it is the caller's checkpoint.

use bbl_adapters::terraform::{credential_env, render_vars};
use bbl_adapters::{Runner, Terraform, TfWorkspace};
use bbl_core::{BblError, Redactor, State};
use bbl_storage::StateStore;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::iaas;

pub const WORKSPACE_DIR: &str = "terraform";

/// Hash identifying one set of provisioner inputs.
pub fn inputs_hash(template: &str, rendered_vars: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(template.as_bytes());
    hasher.update([0u8]);
    hasher.update(rendered_vars.as_bytes());
    hex::encode(hasher.finalize())
}

struct Prepared {
    ws: TfWorkspace,
    template: String,
    vars: iaas::Vars,
    hash: String,
}

#[derive(Debug, Clone)]
pub struct Provisioner<R> {
    terraform: Terraform<R>,
}

impl<R: Runner> Provisioner<R> {
    pub fn new(terraform: Terraform<R>) -> Self {
        Self { terraform }
    }

    fn prepare(&self, store: &StateStore, state: &State) -> Result<Prepared, BblError> {
        let template = iaas::template(state)?;
        let vars = iaas::inputs(state)?;
        let credentials = iaas::credentials(state)?;
        let hash = inputs_hash(&template, &render_vars(&vars)?);

        let mut ws = TfWorkspace::new(store.get_dir(WORKSPACE_DIR)?);
        ws.redactor = Redactor::from_state(state).with(credentials.values());
        ws.env = credential_env(&credentials);
        Ok(Prepared { ws, template, vars, hash })
    }

    /// Keep whatever state terraform left behind.
    fn read_back(ws: &TfWorkspace, state: &mut State) -> Result<(), BblError> {
        let tf_state = ws.read_state()?;
        if !tf_state.is_empty() {
            state.tf_state = tf_state;
        }
        Ok(())
    }

    /// Create or update the network. Returns `false` when the inputs match
    /// the last successful apply and nothing ran.
    pub async fn apply(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        let Prepared { ws, template, vars, hash } = self.prepare(store, state)?;
        if !state.tf_state.is_empty()
            && state.tf_inputs_hash == hash
            && !state.latest_tf_output.is_empty()
        {
            tracing::info!("provisioner inputs unchanged, skipping apply");
            return Ok(false);
        }

        self.terraform.version(&ws, cancel).await?;
        ws.write_inputs(&template, &vars, &state.tf_state)?;
        state.tf_inputs_hash.clear();

        let result = async {
            self.terraform.init(&ws, cancel).await?;
            self.terraform.apply(&ws, cancel).await
        }
        .await;
        let read_back = Self::read_back(&ws, state);
        result?;
        read_back?;

        state.latest_tf_output = self.terraform.outputs(&ws, cancel).await?;
        state.tf_inputs_hash = hash;
        tracing::info!(outputs = state.latest_tf_output.len(), "provisioner apply complete");
        Ok(true)
    }

    /// Tear the network down. Returns `false` when there was nothing to
    /// destroy.
    pub async fn destroy(
        &self,
        store: &StateStore,
        state: &mut State,
        cancel: &CancellationToken,
    ) -> Result<bool, BblError> {
        if state.tf_state.is_empty() {
            tracing::info!("no provisioner state, skipping destroy");
            return Ok(false);
        }
        let Prepared { ws, template, vars, .. } = self.prepare(store, state)?;

        self.terraform.version(&ws, cancel).await?;
        ws.write_inputs(&template, &vars, &state.tf_state)?;
        state.tf_inputs_hash.clear();

        let result = async {
            self.terraform.init(&ws, cancel).await?;
            self.terraform.destroy(&ws, cancel).await
        }
        .await;
        let read_back = Self::read_back(&ws, state);
        result?;
        read_back?;

        state.tf_state.clear();
        state.latest_tf_output.clear();
        tracing::info!("provisioner destroy complete");
        Ok(true)
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
