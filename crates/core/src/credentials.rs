// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-IaaS credential variants.
//!
//! The variant always matches `State::iaas`. Secret-bearing fields use
//! [`Secret`] so a `{:?}` of the state never prints them; `secrets()`
//! exposes them to the log redactor.

use serde::{Deserialize, Serialize};

use crate::{Iaas, Secret};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: Secret,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GcpCredentials {
    /// Service account key, JSON document.
    pub service_account_key: Secret,
    pub project_id: String,
    pub region: String,
    pub zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureCredentials {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenStackCredentials {
    pub auth_url: String,
    pub az: String,
    pub network_id: String,
    pub network_name: String,
    pub username: String,
    pub password: Secret,
    pub project: String,
    pub domain: String,
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cacert_file: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudStackCredentials {
    pub endpoint: String,
    pub api_key: String,
    pub secret_access_key: Secret,
    pub zone: String,
    pub network_vpc_offering: String,
    pub compute_offering: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub iso_segment: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VsphereCredentials {
    pub vcenter_user: String,
    pub vcenter_password: Secret,
    pub vcenter_ip: String,
    pub vcenter_dc: String,
    pub vcenter_cluster: String,
    pub vcenter_rp: String,
    pub network: String,
    pub vcenter_ds: String,
    pub subnet_cidr: String,
    pub vcenter_disks: String,
    pub vcenter_templates: String,
    pub vcenter_vms: String,
}

/// Credentials for exactly one IaaS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IaasCredentials {
    #[serde(rename = "aws")]
    Aws(AwsCredentials),
    #[serde(rename = "gcp")]
    Gcp(GcpCredentials),
    #[serde(rename = "azure")]
    Azure(AzureCredentials),
    #[serde(rename = "openstack")]
    OpenStack(OpenStackCredentials),
    #[serde(rename = "cloudstack")]
    CloudStack(CloudStackCredentials),
    #[serde(rename = "vsphere")]
    Vsphere(VsphereCredentials),
}

/// Collects `(flag-name, value)` pairs whose value is empty.
fn missing(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields.iter().filter(|(_, value)| value.trim().is_empty()).map(|(name, _)| *name).collect()
}

impl IaasCredentials {
    pub fn iaas(&self) -> Iaas {
        match self {
            IaasCredentials::Aws(_) => Iaas::Aws,
            IaasCredentials::Gcp(_) => Iaas::Gcp,
            IaasCredentials::Azure(_) => Iaas::Azure,
            IaasCredentials::OpenStack(_) => Iaas::OpenStack,
            IaasCredentials::CloudStack(_) => Iaas::CloudStack,
            IaasCredentials::Vsphere(_) => Iaas::Vsphere,
        }
    }

    /// Names of required fields that are empty, as the user would spell
    /// them on the command line.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            IaasCredentials::Aws(c) => missing(&[
                ("--aws-access-key-id", c.access_key_id.as_str()),
                ("--aws-secret-access-key", c.secret_access_key.expose()),
                ("--aws-region", c.region.as_str()),
            ]),
            IaasCredentials::Gcp(c) => missing(&[
                ("--gcp-service-account-key", c.service_account_key.expose()),
                ("--gcp-project-id", c.project_id.as_str()),
                ("--gcp-region", c.region.as_str()),
                ("--gcp-zone", c.zone.as_str()),
            ]),
            IaasCredentials::Azure(c) => missing(&[
                ("--azure-subscription-id", c.subscription_id.as_str()),
                ("--azure-tenant-id", c.tenant_id.as_str()),
                ("--azure-client-id", c.client_id.as_str()),
                ("--azure-client-secret", c.client_secret.expose()),
                ("--azure-region", c.region.as_str()),
            ]),
            IaasCredentials::OpenStack(c) => missing(&[
                ("--openstack-auth-url", c.auth_url.as_str()),
                ("--openstack-az", c.az.as_str()),
                ("--openstack-network-id", c.network_id.as_str()),
                ("--openstack-network-name", c.network_name.as_str()),
                ("--openstack-username", c.username.as_str()),
                ("--openstack-password", c.password.expose()),
                ("--openstack-project", c.project.as_str()),
                ("--openstack-domain", c.domain.as_str()),
            ]),
            IaasCredentials::CloudStack(c) => missing(&[
                ("--cloudstack-endpoint", c.endpoint.as_str()),
                ("--cloudstack-api-key", c.api_key.as_str()),
                ("--cloudstack-secret-access-key", c.secret_access_key.expose()),
                ("--cloudstack-zone", c.zone.as_str()),
                ("--cloudstack-network-vpc-offering", c.network_vpc_offering.as_str()),
                ("--cloudstack-compute-offering", c.compute_offering.as_str()),
            ]),
            IaasCredentials::Vsphere(c) => missing(&[
                ("--vsphere-vcenter-user", c.vcenter_user.as_str()),
                ("--vsphere-vcenter-password", c.vcenter_password.expose()),
                ("--vsphere-vcenter-ip", c.vcenter_ip.as_str()),
                ("--vsphere-vcenter-dc", c.vcenter_dc.as_str()),
                ("--vsphere-vcenter-cluster", c.vcenter_cluster.as_str()),
                ("--vsphere-vcenter-rp", c.vcenter_rp.as_str()),
                ("--vsphere-network", c.network.as_str()),
                ("--vsphere-vcenter-ds", c.vcenter_ds.as_str()),
                ("--vsphere-subnet-cidr", c.subnet_cidr.as_str()),
                ("--vsphere-vcenter-disks", c.vcenter_disks.as_str()),
                ("--vsphere-vcenter-templates", c.vcenter_templates.as_str()),
                ("--vsphere-vcenter-vms", c.vcenter_vms.as_str()),
            ]),
        }
    }

    /// Secret values carried by this variant.
    pub fn secrets(&self) -> Vec<&str> {
        let secret = match self {
            IaasCredentials::Aws(c) => &c.secret_access_key,
            IaasCredentials::Gcp(c) => &c.service_account_key,
            IaasCredentials::Azure(c) => &c.client_secret,
            IaasCredentials::OpenStack(c) => &c.password,
            IaasCredentials::CloudStack(c) => &c.secret_access_key,
            IaasCredentials::Vsphere(c) => &c.vcenter_password,
        };
        if secret.is_empty() {
            Vec::new()
        } else {
            vec![secret.expose()]
        }
    }

    /// Region-like location, used for log context and terraform inputs.
    pub fn region(&self) -> Option<&str> {
        let region = match self {
            IaasCredentials::Aws(c) => &c.region,
            IaasCredentials::Gcp(c) => &c.region,
            IaasCredentials::Azure(c) => &c.region,
            IaasCredentials::OpenStack(c) => &c.region,
            IaasCredentials::CloudStack(c) => &c.zone,
            IaasCredentials::Vsphere(c) => &c.vcenter_dc,
        };
        Some(region.as_str()).filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
