// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment manifests for the jumpbox and the director.
//!
//! A manifest is a base document patched by the IaaS ops files. Its
//! `((variables))` are left for the deployer to resolve from the vars file
//! built here, the secrets file and its own vars-store.

pub mod interpolate;
pub mod patch;

use std::fmt;

use bbl_core::{BblError, Iaas, State};
use serde_yaml::Mapping;

use crate::iaas::{self, Secrets, Vars};
use crate::{assets, cidr};

pub use interpolate::InterpolateError;
pub use patch::PatchError;

const JUMPBOX_PREFIX: &str = "jumpbox__";
const DIRECTOR_PREFIX: &str = "director__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Jumpbox,
    Director,
}

impl Deployment {
    pub fn name(&self) -> &'static str {
        match self {
            Deployment::Jumpbox => "jumpbox",
            Deployment::Director => "director",
        }
    }

    /// Workspace directory under the state dir.
    pub fn dir(&self) -> &'static str {
        match self {
            Deployment::Jumpbox => "jumpbox-deployment",
            Deployment::Director => "bosh-deployment",
        }
    }

    fn base(&self) -> &'static str {
        match self {
            Deployment::Jumpbox => "jumpbox-deployment/jumpbox.yml",
            Deployment::Director => "bosh-deployment/bosh.yml",
        }
    }

    fn ops(&self, iaas: Iaas) -> Result<Vec<&'static str>, BblError> {
        match self {
            Deployment::Jumpbox => iaas::jumpbox_ops(iaas),
            Deployment::Director => iaas::director_ops(iaas),
        }
    }

    /// Output prefixes addressed to this deployment and to the other one.
    fn prefixes(&self) -> (&'static str, &'static str) {
        match self {
            Deployment::Jumpbox => (JUMPBOX_PREFIX, DIRECTOR_PREFIX),
            Deployment::Director => (DIRECTOR_PREFIX, JUMPBOX_PREFIX),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything `bosh create-env` reads besides its own state and vars-store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentInputs {
    pub manifest: String,
    /// Non-secret variables, YAML.
    pub vars_file: String,
    /// Secret IaaS variables, YAML; empty when there are none.
    pub secrets: String,
}

impl From<PatchError> for BblError {
    fn from(err: PatchError) -> Self {
        BblError::InvariantViolation(format!("embedded ops file does not apply: {err}"))
    }
}

impl From<InterpolateError> for BblError {
    fn from(err: InterpolateError) -> Self {
        BblError::UserInput(format!("cannot render config: {err}"))
    }
}

fn to_yaml<T: serde::Serialize>(value: &T) -> Result<String, BblError> {
    serde_yaml::to_string(value)
        .map_err(|e| BblError::InvariantViolation(format!("failed to encode YAML: {e}")))
}

/// Provisioner outputs as seen by one deployment: its own `<name>__`
/// outputs lose the prefix, the other deployment's are dropped.
pub fn outputs_for(state: &State, deployment: Deployment) -> Vars {
    let (own, other) = deployment.prefixes();
    let mut vars = Vars::new();
    for (name, value) in &state.latest_tf_output {
        if name.starts_with(other) {
            continue;
        }
        let name = name.strip_prefix(own).unwrap_or(name);
        vars.insert(name.to_string(), value.clone());
    }
    vars
}

/// Non-secret variables for `deployment`.
pub fn vars(state: &State, deployment: Deployment) -> Result<Vars, BblError> {
    let mut vars = outputs_for(state, deployment);
    if deployment == Deployment::Director {
        iaas::put(&mut vars, "director_name", format!("bosh-{}", state.env_id));
    }
    vars.extend(iaas::deploy_vars(state)?);
    Ok(vars)
}

fn secrets_yaml(secrets: &Secrets) -> Result<String, BblError> {
    if secrets.is_empty() {
        return Ok(String::new());
    }
    to_yaml(secrets)
}

/// Manifest, vars file and secrets for one deployment. Deterministic in
/// `state`.
pub fn build(state: &State, deployment: Deployment) -> Result<DeploymentInputs, BblError> {
    let iaas = state
        .iaas
        .ok_or_else(|| BblError::UserInput("cannot build manifests without an iaas".into()))?;
    let ops = deployment.ops(iaas)?;
    let manifest = patch::patch(assets::require(deployment.base())?, &ops)?;
    Ok(DeploymentInputs {
        manifest,
        vars_file: to_yaml(&vars(state, deployment)?)?,
        secrets: secrets_yaml(&iaas::deploy_secrets(state)?)?,
    })
}

/// Patch `base` with `ops`, then resolve every placeholder from `vars`.
pub fn render(base: &str, ops: &[&str], vars: &Vars) -> Result<String, BblError> {
    let mut doc: serde_yaml::Value = serde_yaml::from_str(base)
        .map_err(|e| BblError::InvariantViolation(format!("embedded template is invalid: {e}")))?;
    for ops_file in ops {
        patch::apply(&mut doc, &patch::parse_ops(ops_file)?)?;
    }
    let vars: Mapping = match serde_yaml::to_value(vars) {
        Ok(serde_yaml::Value::Mapping(m)) => m,
        _ => Mapping::new(),
    };
    interpolate::interpolate(&mut doc, &vars)?;
    to_yaml(&doc)
}

/// Variables for the cloud-config: director-side outputs, the IaaS
/// variables and the subnet ranges.
pub fn cloud_config_vars(state: &State) -> Result<Vars, BblError> {
    let mut vars = vars(state, Deployment::Director)?;
    let cidr: cidr::Ipv4Cidr = state
        .output_str("internal_cidr")
        .ok_or_else(|| {
            BblError::InvariantViolation("provisioner outputs are missing internal_cidr".into())
        })?
        .parse()?;
    iaas::put(&mut vars, "reserved_range", cidr.range(cidr::RESERVED_HOSTS)?);
    iaas::put(&mut vars, "static_range", cidr.range(cidr::STATIC_HOSTS)?);
    Ok(vars)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
