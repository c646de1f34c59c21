// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-IaaS generators, resolved through one dispatch row per [`Iaas`].
//!
//! A row supplies the provisioner inputs, the secret credentials passed
//! through the child's environment, the variables the deployer needs and
//! an environment check. Template fragments and ops files are found by
//! asset name, so adding an IaaS is one row, its assets and five small
//! functions.

mod aws;
mod azure;
mod cloudstack;
mod gcp;
mod openstack;
mod vsphere;

use bbl_core::{short_env_id, BblError, Iaas, IaasCredentials, LbType, State};
use indexmap::IndexMap;
use serde_json::Value;

use crate::assets;

/// Ordered variables; order is part of the rendered output.
pub type Vars = IndexMap<String, Value>;
/// Secret variables, never written next to the state.
pub type Secrets = IndexMap<String, String>;

type VarsFn = fn(&State, &IaasCredentials, &mut Vars);
type SecretsFn = fn(&State, &IaasCredentials, &mut Secrets);

pub struct IaasRow {
    pub iaas: Iaas,
    /// An SSH key pair is generated locally and uploaded by the template.
    pub needs_keypair: bool,
    pub lb_types: &'static [LbType],
    /// The template has a DNS zone fragment for `cf` load balancers.
    pub dns_overlay: bool,
    inputs: VarsFn,
    credentials: SecretsFn,
    deploy_vars: VarsFn,
    deploy_secrets: SecretsFn,
    validate_environment: fn(&IaasCredentials) -> Result<(), BblError>,
}

const FULL_LB: &[LbType] = &[LbType::Concourse, LbType::Cf];
const NO_LB: &[LbType] = &[];

static ROWS: [IaasRow; 6] = [
    IaasRow {
        iaas: Iaas::Aws,
        needs_keypair: true,
        lb_types: FULL_LB,
        dns_overlay: true,
        inputs: aws::inputs,
        credentials: aws::credentials,
        deploy_vars: aws::deploy_vars,
        deploy_secrets: aws::deploy_secrets,
        validate_environment: aws::validate,
    },
    IaasRow {
        iaas: Iaas::Gcp,
        needs_keypair: true,
        lb_types: FULL_LB,
        dns_overlay: true,
        inputs: gcp::inputs,
        credentials: gcp::credentials,
        deploy_vars: gcp::deploy_vars,
        deploy_secrets: gcp::deploy_secrets,
        validate_environment: gcp::validate,
    },
    IaasRow {
        iaas: Iaas::Azure,
        needs_keypair: false,
        lb_types: FULL_LB,
        dns_overlay: false,
        inputs: azure::inputs,
        credentials: azure::credentials,
        deploy_vars: azure::deploy_vars,
        deploy_secrets: azure::deploy_secrets,
        validate_environment: azure::validate,
    },
    IaasRow {
        iaas: Iaas::OpenStack,
        needs_keypair: false,
        lb_types: NO_LB,
        dns_overlay: false,
        inputs: openstack::inputs,
        credentials: openstack::credentials,
        deploy_vars: openstack::deploy_vars,
        deploy_secrets: openstack::deploy_secrets,
        validate_environment: openstack::validate,
    },
    IaasRow {
        iaas: Iaas::CloudStack,
        needs_keypair: false,
        lb_types: NO_LB,
        dns_overlay: false,
        inputs: cloudstack::inputs,
        credentials: cloudstack::credentials,
        deploy_vars: cloudstack::deploy_vars,
        deploy_secrets: cloudstack::deploy_secrets,
        validate_environment: cloudstack::validate,
    },
    IaasRow {
        iaas: Iaas::Vsphere,
        needs_keypair: false,
        lb_types: NO_LB,
        dns_overlay: false,
        inputs: vsphere::inputs,
        credentials: vsphere::credentials,
        deploy_vars: vsphere::deploy_vars,
        deploy_secrets: vsphere::deploy_secrets,
        validate_environment: vsphere::validate,
    },
];

pub fn row(iaas: Iaas) -> &'static IaasRow {
    // ROWS lists every variant, in declaration order.
    &ROWS[iaas as usize]
}

fn iaas_of(state: &State) -> Result<Iaas, BblError> {
    state.iaas.ok_or_else(|| {
        BblError::UserInput(
            "--iaas [gcp, aws, azure, openstack, cloudstack, vsphere] must be provided".into(),
        )
    })
}

fn credentials_of(state: &State) -> Result<(&'static IaasRow, &IaasCredentials), BblError> {
    let iaas = iaas_of(state)?;
    match &state.iaas_credentials {
        Some(creds) if creds.iaas() == iaas => Ok((row(iaas), creds)),
        Some(creds) => Err(BblError::UserInput(format!(
            "credentials are for {} but the environment is on {iaas}",
            creds.iaas()
        ))),
        None => Err(BblError::UserInput(format!("{iaas} credentials must be provided"))),
    }
}

/// Credential presence and per-IaaS consistency checks.
pub fn validate_credentials(state: &State) -> Result<(), BblError> {
    let (row, creds) = credentials_of(state)?;
    let missing = creds.missing_fields();
    if !missing.is_empty() {
        return Err(BblError::UserInput(format!(
            "{} credentials are incomplete; missing {}",
            row.iaas,
            missing.join(", ")
        )));
    }
    (row.validate_environment)(creds)
}

/// Reject load balancers the IaaS does not offer.
pub fn validate_lb(iaas: Iaas, lb_type: LbType) -> Result<(), BblError> {
    if lb_type == LbType::None || row(iaas).lb_types.contains(&lb_type) {
        return Ok(());
    }
    Err(BblError::UserInput(format!("{lb_type} load balancers are not supported on {iaas}")))
}

pub(crate) fn put(vars: &mut Vars, key: &str, value: impl Into<Value>) {
    vars.insert(key.to_string(), value.into());
}

/// Insert only when `value` is non-empty.
pub(crate) fn put_opt(vars: &mut Vars, key: &str, value: &str) {
    if !value.is_empty() {
        put(vars, key, value);
    }
}

pub(crate) fn put_secret(secrets: &mut Secrets, key: &str, value: &str) {
    secrets.insert(key.to_string(), value.to_string());
}

fn cf_lb(state: &State) -> bool {
    state.lb.lb_type == LbType::Cf
}

/// Provisioner variables that may be written to disk.
pub fn inputs(state: &State) -> Result<Vars, BblError> {
    let (row, creds) = credentials_of(state)?;
    let mut vars = Vars::new();
    put(&mut vars, "env_id", state.env_id.as_str());
    put(&mut vars, "short_env_id", short_env_id(&state.env_id));
    (row.inputs)(state, creds, &mut vars);
    if cf_lb(state) {
        put_opt(&mut vars, "ssl_certificate", &state.lb.cert);
        put_opt(&mut vars, "ssl_certificate_chain", &state.lb.chain);
        if row.dns_overlay {
            put_opt(&mut vars, "system_domain", &state.lb.domain);
        }
    }
    Ok(vars)
}

/// Secret provisioner variables, delivered as `TF_VAR_*`.
pub fn credentials(state: &State) -> Result<Secrets, BblError> {
    let (row, creds) = credentials_of(state)?;
    let mut secrets = Secrets::new();
    (row.credentials)(state, creds, &mut secrets);
    if cf_lb(state) && !state.lb.key.is_empty() {
        put_secret(&mut secrets, "ssl_certificate_private_key", state.lb.key.expose());
    }
    Ok(secrets)
}

/// Provisioner source: provider, network, outputs, then overlays.
pub fn template(state: &State) -> Result<String, BblError> {
    let iaas = iaas_of(state)?;
    let row = row(iaas);
    let mut names = vec![
        format!("terraform/{iaas}/provider.tf"),
        format!("terraform/{iaas}/network.tf"),
        format!("terraform/{iaas}/outputs.tf"),
    ];
    let lb_type = state.lb.lb_type;
    if lb_type != LbType::None && row.lb_types.contains(&lb_type) {
        names.push(format!("terraform/{iaas}/lb_{lb_type}.tf"));
        if lb_type == LbType::Cf && row.dns_overlay && !state.lb.domain.is_empty() {
            names.push(format!("terraform/{iaas}/dns.tf"));
        }
    }
    let fragments =
        names.iter().map(|name| assets::require(name)).collect::<Result<Vec<_>, _>>()?;
    Ok(fragments.join("\n"))
}

/// Non-secret variables for `bosh create-env` on top of provisioner outputs.
pub fn deploy_vars(state: &State) -> Result<Vars, BblError> {
    let (row, creds) = credentials_of(state)?;
    let mut vars = Vars::new();
    (row.deploy_vars)(state, creds, &mut vars);
    Ok(vars)
}

/// Secret variables for `bosh create-env`, passed with `-l`.
pub fn deploy_secrets(state: &State) -> Result<Secrets, BblError> {
    let (row, creds) = credentials_of(state)?;
    let mut secrets = Secrets::new();
    (row.deploy_secrets)(state, creds, &mut secrets);
    Ok(secrets)
}

/// Jumpbox CPI ops file.
pub fn jumpbox_ops(iaas: Iaas) -> Result<Vec<&'static str>, BblError> {
    Ok(vec![assets::require(&format!("jumpbox-deployment/{iaas}/cpi.yml"))?])
}

/// Director ops files: jumpbox user, then the CPI.
pub fn director_ops(iaas: Iaas) -> Result<Vec<&'static str>, BblError> {
    Ok(vec![
        assets::require("bosh-deployment/jumpbox-user.yml")?,
        assets::require(&format!("bosh-deployment/{iaas}/cpi.yml"))?,
    ])
}

/// Cloud-config ops files: the IaaS ops, then the load balancer extension.
pub fn cloud_config_ops(state: &State) -> Result<Vec<&'static str>, BblError> {
    let iaas = iaas_of(state)?;
    let mut ops = vec![assets::require(&format!("cloud-config/{iaas}/ops.yml"))?];
    let lb_type = state.lb.lb_type;
    if lb_type != LbType::None && row(iaas).lb_types.contains(&lb_type) {
        ops.push(assets::require(&format!("cloud-config/{iaas}/lb_{lb_type}.yml"))?);
    }
    Ok(ops)
}

/// Outputs describing load balancers, for `bbl lbs`.
pub fn is_lb_output(name: &str) -> bool {
    name.contains("lb_") || name.starts_with("router_") || name.ends_with("target_pool")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
