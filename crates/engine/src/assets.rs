// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Templates and manifests compiled into the binary.
//!
//! Names are paths relative to `assets/`, e.g. `terraform/gcp/network.tf`.

use std::fs;
use std::io;
use std::path::Path;

macro_rules! assets {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../assets/", $name)))),*]
    };
}

static ASSETS: &[(&str, &str)] = assets![
    "bosh-deployment/aws/cpi.yml",
    "bosh-deployment/azure/cpi.yml",
    "bosh-deployment/bosh.yml",
    "bosh-deployment/cloudstack/cpi.yml",
    "bosh-deployment/gcp/cpi.yml",
    "bosh-deployment/jumpbox-user.yml",
    "bosh-deployment/openstack/cpi.yml",
    "bosh-deployment/vsphere/cpi.yml",
    "cloud-config/aws/lb_cf.yml",
    "cloud-config/aws/lb_concourse.yml",
    "cloud-config/aws/ops.yml",
    "cloud-config/azure/lb_cf.yml",
    "cloud-config/azure/lb_concourse.yml",
    "cloud-config/azure/ops.yml",
    "cloud-config/cloud-config.yml",
    "cloud-config/cloudstack/ops.yml",
    "cloud-config/gcp/lb_cf.yml",
    "cloud-config/gcp/lb_concourse.yml",
    "cloud-config/gcp/ops.yml",
    "cloud-config/openstack/ops.yml",
    "cloud-config/vsphere/ops.yml",
    "jumpbox-deployment/aws/cpi.yml",
    "jumpbox-deployment/azure/cpi.yml",
    "jumpbox-deployment/cloudstack/cpi.yml",
    "jumpbox-deployment/gcp/cpi.yml",
    "jumpbox-deployment/jumpbox.yml",
    "jumpbox-deployment/openstack/cpi.yml",
    "jumpbox-deployment/vsphere/cpi.yml",
    "runtime-configs/dns.yml",
    "terraform/aws/dns.tf",
    "terraform/aws/lb_cf.tf",
    "terraform/aws/lb_concourse.tf",
    "terraform/aws/network.tf",
    "terraform/aws/outputs.tf",
    "terraform/aws/provider.tf",
    "terraform/azure/lb_cf.tf",
    "terraform/azure/lb_concourse.tf",
    "terraform/azure/network.tf",
    "terraform/azure/outputs.tf",
    "terraform/azure/provider.tf",
    "terraform/cloudstack/network.tf",
    "terraform/cloudstack/outputs.tf",
    "terraform/cloudstack/provider.tf",
    "terraform/gcp/dns.tf",
    "terraform/gcp/lb_cf.tf",
    "terraform/gcp/lb_concourse.tf",
    "terraform/gcp/network.tf",
    "terraform/gcp/outputs.tf",
    "terraform/gcp/provider.tf",
    "terraform/openstack/network.tf",
    "terraform/openstack/outputs.tf",
    "terraform/openstack/provider.tf",
    "terraform/vsphere/network.tf",
    "terraform/vsphere/outputs.tf",
    "terraform/vsphere/provider.tf",
];

/// Contents of the asset at `name`.
pub fn get(name: &str) -> Option<&'static str> {
    ASSETS.iter().find(|(n, _)| *n == name).map(|(_, body)| *body)
}

/// Like [`get`], for names the crate itself references.
pub(crate) fn require(name: &str) -> Result<&'static str, bbl_core::BblError> {
    get(name).ok_or_else(|| bbl_core::BblError::InvariantViolation(format!("missing embedded asset {name}")))
}

fn relative<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('/'))
}

/// Asset names under `prefix/`.
pub fn list(prefix: &str) -> impl Iterator<Item = &'static str> + '_ {
    ASSETS.iter().map(|(name, _)| *name).filter(move |name| relative(name, prefix).is_some())
}

/// Write every asset under `prefix/` into `dir`, keeping relative paths.
///
/// Existing files are overwritten so the directory always shows what the
/// last run used.
pub fn materialize(prefix: &str, dir: &Path) -> io::Result<()> {
    for (name, body) in ASSETS {
        let Some(rel) = relative(name, prefix) else {
            continue;
        };
        let target = dir.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, body)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "assets_tests.rs"]
mod tests;
