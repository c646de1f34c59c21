// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IaaS credential flags and their `BBL_*` environment variables.

use std::path::Path;

use bbl_core::{
    AwsCredentials, AzureCredentials, BblError, CloudStackCredentials, GcpCredentials, Iaas,
    IaasCredentials, OpenStackCredentials, Secret, VsphereCredentials,
};
use clap::Args;

#[derive(Args, Clone, Default)]
pub struct CredentialArgs {
    /// AWS access key id
    #[arg(long, env = "BBL_AWS_ACCESS_KEY_ID", global = true, hide_env_values = true)]
    pub aws_access_key_id: Option<String>,
    /// AWS secret access key
    #[arg(long, env = "BBL_AWS_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,
    /// AWS region
    #[arg(long, env = "BBL_AWS_REGION", global = true)]
    pub aws_region: Option<String>,

    /// GCP service account key, as a path or the JSON itself
    #[arg(long, env = "BBL_GCP_SERVICE_ACCOUNT_KEY", global = true, hide_env_values = true)]
    pub gcp_service_account_key: Option<String>,
    /// GCP project id
    #[arg(long, env = "BBL_GCP_PROJECT_ID", global = true)]
    pub gcp_project_id: Option<String>,
    /// GCP region
    #[arg(long, env = "BBL_GCP_REGION", global = true)]
    pub gcp_region: Option<String>,
    /// GCP zone
    #[arg(long, env = "BBL_GCP_ZONE", global = true)]
    pub gcp_zone: Option<String>,

    #[arg(long, env = "BBL_AZURE_SUBSCRIPTION_ID", global = true)]
    pub azure_subscription_id: Option<String>,
    #[arg(long, env = "BBL_AZURE_TENANT_ID", global = true)]
    pub azure_tenant_id: Option<String>,
    #[arg(long, env = "BBL_AZURE_CLIENT_ID", global = true)]
    pub azure_client_id: Option<String>,
    #[arg(long, env = "BBL_AZURE_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub azure_client_secret: Option<String>,
    #[arg(long, env = "BBL_AZURE_REGION", global = true)]
    pub azure_region: Option<String>,

    #[arg(long, env = "BBL_OPENSTACK_AUTH_URL", global = true)]
    pub openstack_auth_url: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_AZ", global = true)]
    pub openstack_az: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_NETWORK_ID", global = true)]
    pub openstack_network_id: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_NETWORK_NAME", global = true)]
    pub openstack_network_name: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_USERNAME", global = true)]
    pub openstack_username: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_PASSWORD", global = true, hide_env_values = true)]
    pub openstack_password: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_PROJECT", global = true)]
    pub openstack_project: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_DOMAIN", global = true)]
    pub openstack_domain: Option<String>,
    #[arg(long, env = "BBL_OPENSTACK_REGION", global = true)]
    pub openstack_region: Option<String>,
    /// CA certificate file for the OpenStack API
    #[arg(long, env = "BBL_OPENSTACK_CACERT_FILE", global = true)]
    pub openstack_cacert_file: Option<String>,
    /// Skip TLS verification of the OpenStack API
    #[arg(long, env = "BBL_OPENSTACK_INSECURE", global = true)]
    pub openstack_insecure: bool,

    #[arg(long, env = "BBL_CLOUDSTACK_ENDPOINT", global = true)]
    pub cloudstack_endpoint: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_API_KEY", global = true)]
    pub cloudstack_api_key: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub cloudstack_secret_access_key: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_ZONE", global = true)]
    pub cloudstack_zone: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_NETWORK_VPC_OFFERING", global = true)]
    pub cloudstack_network_vpc_offering: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_COMPUTE_OFFERING", global = true)]
    pub cloudstack_compute_offering: Option<String>,
    #[arg(long, env = "BBL_CLOUDSTACK_ISO_SEGMENT", global = true)]
    pub cloudstack_iso_segment: bool,

    #[arg(long, env = "BBL_VSPHERE_VCENTER_USER", global = true)]
    pub vsphere_vcenter_user: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_PASSWORD", global = true, hide_env_values = true)]
    pub vsphere_vcenter_password: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_IP", global = true)]
    pub vsphere_vcenter_ip: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_DC", global = true)]
    pub vsphere_vcenter_dc: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_CLUSTER", global = true)]
    pub vsphere_vcenter_cluster: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_RP", global = true)]
    pub vsphere_vcenter_rp: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_NETWORK", global = true)]
    pub vsphere_network: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_DS", global = true)]
    pub vsphere_vcenter_ds: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_SUBNET_CIDR", global = true)]
    pub vsphere_subnet_cidr: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_DISKS", global = true)]
    pub vsphere_vcenter_disks: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_TEMPLATES", global = true)]
    pub vsphere_vcenter_templates: Option<String>,
    #[arg(long, env = "BBL_VSPHERE_VCENTER_VMS", global = true)]
    pub vsphere_vcenter_vms: Option<String>,
}

fn any_given(fields: &[&Option<String>]) -> bool {
    fields.iter().any(|field| field.is_some())
}

fn text(field: &Option<String>) -> String {
    field.clone().unwrap_or_default()
}

fn secret(field: &Option<String>) -> Secret {
    Secret::new(text(field))
}

/// Accept either the key document or a path to it.
fn service_account_key(value: &str) -> Result<Secret, BblError> {
    if value.trim_start().starts_with('{') {
        return Ok(Secret::new(value));
    }
    let path = Path::new(value);
    std::fs::read_to_string(path).map(Secret::new).map_err(|e| {
        BblError::UserInput(format!(
            "--gcp-service-account-key: cannot read {}: {e}",
            path.display()
        ))
    })
}

impl CredentialArgs {
    /// Credentials for `iaas` from this invocation, or `None` when no flag
    /// for it was given and the stored credentials should be used.
    pub fn for_iaas(&self, iaas: Iaas) -> Result<Option<IaasCredentials>, BblError> {
        let creds = match iaas {
            Iaas::Aws => {
                if !any_given(&[&self.aws_access_key_id, &self.aws_secret_access_key, &self.aws_region])
                {
                    return Ok(None);
                }
                IaasCredentials::Aws(AwsCredentials {
                    access_key_id: text(&self.aws_access_key_id),
                    secret_access_key: secret(&self.aws_secret_access_key),
                    region: text(&self.aws_region),
                })
            }
            Iaas::Gcp => {
                if !any_given(&[
                    &self.gcp_service_account_key,
                    &self.gcp_project_id,
                    &self.gcp_region,
                    &self.gcp_zone,
                ]) {
                    return Ok(None);
                }
                let key = match &self.gcp_service_account_key {
                    Some(value) => service_account_key(value)?,
                    None => Secret::default(),
                };
                IaasCredentials::Gcp(GcpCredentials {
                    service_account_key: key,
                    project_id: text(&self.gcp_project_id),
                    region: text(&self.gcp_region),
                    zone: text(&self.gcp_zone),
                })
            }
            Iaas::Azure => {
                if !any_given(&[
                    &self.azure_subscription_id,
                    &self.azure_tenant_id,
                    &self.azure_client_id,
                    &self.azure_client_secret,
                    &self.azure_region,
                ]) {
                    return Ok(None);
                }
                IaasCredentials::Azure(AzureCredentials {
                    subscription_id: text(&self.azure_subscription_id),
                    tenant_id: text(&self.azure_tenant_id),
                    client_id: text(&self.azure_client_id),
                    client_secret: secret(&self.azure_client_secret),
                    region: text(&self.azure_region),
                })
            }
            Iaas::OpenStack => {
                if !any_given(&[
                    &self.openstack_auth_url,
                    &self.openstack_az,
                    &self.openstack_network_id,
                    &self.openstack_network_name,
                    &self.openstack_username,
                    &self.openstack_password,
                    &self.openstack_project,
                    &self.openstack_domain,
                    &self.openstack_region,
                    &self.openstack_cacert_file,
                ]) {
                    return Ok(None);
                }
                IaasCredentials::OpenStack(OpenStackCredentials {
                    auth_url: text(&self.openstack_auth_url),
                    az: text(&self.openstack_az),
                    network_id: text(&self.openstack_network_id),
                    network_name: text(&self.openstack_network_name),
                    username: text(&self.openstack_username),
                    password: secret(&self.openstack_password),
                    project: text(&self.openstack_project),
                    domain: text(&self.openstack_domain),
                    region: text(&self.openstack_region),
                    cacert_file: text(&self.openstack_cacert_file),
                    insecure: self.openstack_insecure,
                })
            }
            Iaas::CloudStack => {
                if !any_given(&[
                    &self.cloudstack_endpoint,
                    &self.cloudstack_api_key,
                    &self.cloudstack_secret_access_key,
                    &self.cloudstack_zone,
                    &self.cloudstack_network_vpc_offering,
                    &self.cloudstack_compute_offering,
                ]) {
                    return Ok(None);
                }
                IaasCredentials::CloudStack(CloudStackCredentials {
                    endpoint: text(&self.cloudstack_endpoint),
                    api_key: text(&self.cloudstack_api_key),
                    secret_access_key: secret(&self.cloudstack_secret_access_key),
                    zone: text(&self.cloudstack_zone),
                    network_vpc_offering: text(&self.cloudstack_network_vpc_offering),
                    compute_offering: text(&self.cloudstack_compute_offering),
                    iso_segment: self.cloudstack_iso_segment,
                })
            }
            Iaas::Vsphere => {
                if !any_given(&[
                    &self.vsphere_vcenter_user,
                    &self.vsphere_vcenter_password,
                    &self.vsphere_vcenter_ip,
                    &self.vsphere_vcenter_dc,
                    &self.vsphere_vcenter_cluster,
                    &self.vsphere_vcenter_rp,
                    &self.vsphere_network,
                    &self.vsphere_vcenter_ds,
                    &self.vsphere_subnet_cidr,
                    &self.vsphere_vcenter_disks,
                    &self.vsphere_vcenter_templates,
                    &self.vsphere_vcenter_vms,
                ]) {
                    return Ok(None);
                }
                IaasCredentials::Vsphere(VsphereCredentials {
                    vcenter_user: text(&self.vsphere_vcenter_user),
                    vcenter_password: secret(&self.vsphere_vcenter_password),
                    vcenter_ip: text(&self.vsphere_vcenter_ip),
                    vcenter_dc: text(&self.vsphere_vcenter_dc),
                    vcenter_cluster: text(&self.vsphere_vcenter_cluster),
                    vcenter_rp: text(&self.vsphere_vcenter_rp),
                    network: text(&self.vsphere_network),
                    vcenter_ds: text(&self.vsphere_vcenter_ds),
                    subnet_cidr: text(&self.vsphere_subnet_cidr),
                    vcenter_disks: text(&self.vsphere_vcenter_disks),
                    vcenter_templates: text(&self.vsphere_vcenter_templates),
                    vcenter_vms: text(&self.vsphere_vcenter_vms),
                })
            }
        };
        Ok(Some(creds))
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
