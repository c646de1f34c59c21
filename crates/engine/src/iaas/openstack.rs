// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_opt, put_secret, Secrets, Vars};

pub(super) fn inputs(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::OpenStack(c) = creds else { return };
    put(vars, "auth_url", c.auth_url.as_str());
    put(vars, "availability_zone", c.az.as_str());
    put(vars, "ext_net_id", c.network_id.as_str());
    put(vars, "ext_net_name", c.network_name.as_str());
    put(vars, "tenant_name", c.project.as_str());
    put(vars, "domain_name", c.domain.as_str());
    put_opt(vars, "region_name", &c.region);
    put_opt(vars, "cacert_file", &c.cacert_file);
    if c.insecure {
        put(vars, "insecure", true);
    }
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::OpenStack(c) = creds else { return };
    put_secret(secrets, "user_name", &c.username);
    put_secret(secrets, "password", c.password.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::OpenStack(c) = creds else { return };
    put(vars, "auth_url", c.auth_url.as_str());
    put(vars, "az", c.az.as_str());
    put(vars, "openstack_username", c.username.as_str());
    put(vars, "openstack_project", c.project.as_str());
    put(vars, "openstack_domain", c.domain.as_str());
    put(vars, "region", c.region.as_str());
}

pub(super) fn deploy_secrets(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::OpenStack(c) = creds else { return };
    put_secret(secrets, "openstack_password", c.password.expose());
}

pub(super) fn validate(creds: &IaasCredentials) -> Result<(), BblError> {
    let IaasCredentials::OpenStack(c) = creds else { return Ok(()) };
    if !(c.auth_url.starts_with("https://") || c.auth_url.starts_with("http://")) {
        return Err(BblError::UserInput(format!(
            "--openstack-auth-url {:?} must be an http(s) URL",
            c.auth_url
        )));
    }
    if c.insecure && !c.cacert_file.is_empty() {
        return Err(BblError::UserInput(
            "--openstack-insecure and --openstack-cacert-file are mutually exclusive".into(),
        ));
    }
    Ok(())
}
