// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vSphere has no provisioner-managed network; the template only echoes
//! the vCenter layout back as outputs.

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_secret, Secrets, Vars};
use crate::cidr::{Ipv4Cidr, STATIC_HOSTS};

pub(super) fn inputs(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Vsphere(c) = creds else { return };
    put(vars, "vsphere_subnet_cidr", c.subnet_cidr.as_str());
    put(vars, "network_name", c.network.as_str());
    put(vars, "vcenter_cluster", c.vcenter_cluster.as_str());
    put(vars, "vcenter_dc", c.vcenter_dc.as_str());
    put(vars, "vcenter_ds", c.vcenter_ds.as_str());
    put(vars, "vcenter_ip", c.vcenter_ip.as_str());
    put(vars, "vcenter_rp", c.vcenter_rp.as_str());
    put(vars, "vcenter_disks", c.vcenter_disks.as_str());
    put(vars, "vcenter_templates", c.vcenter_templates.as_str());
    put(vars, "vcenter_vms", c.vcenter_vms.as_str());
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Vsphere(c) = creds else { return };
    put_secret(secrets, "vcenter_user", &c.vcenter_user);
    put_secret(secrets, "vcenter_password", c.vcenter_password.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Vsphere(c) = creds else { return };
    put(vars, "vcenter_user", c.vcenter_user.as_str());
}

pub(super) fn deploy_secrets(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Vsphere(c) = creds else { return };
    put_secret(secrets, "vcenter_password", c.vcenter_password.expose());
}

/// The subnet must parse and hold the static IP range.
pub(super) fn validate(creds: &IaasCredentials) -> Result<(), BblError> {
    let IaasCredentials::Vsphere(c) = creds else { return Ok(()) };
    let cidr: Ipv4Cidr = c.subnet_cidr.parse()?;
    cidr.range(STATIC_HOSTS).map(drop)
}
