// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_secret, Secrets, Vars};

pub(super) fn inputs(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::CloudStack(c) = creds else { return };
    put(vars, "endpoint", c.endpoint.as_str());
    put(vars, "zone", c.zone.as_str());
    put(vars, "network_vpc_offering", c.network_vpc_offering.as_str());
    if c.iso_segment {
        put(vars, "iso_segment", true);
    }
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::CloudStack(c) = creds else { return };
    put_secret(secrets, "api_key", &c.api_key);
    put_secret(secrets, "secret_key", c.secret_access_key.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::CloudStack(c) = creds else { return };
    put(vars, "cloudstack_endpoint", c.endpoint.as_str());
    put(vars, "cloudstack_api_key", c.api_key.as_str());
    put(vars, "cloudstack_zone", c.zone.as_str());
    put(vars, "compute_offering", c.compute_offering.as_str());
}

pub(super) fn deploy_secrets(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::CloudStack(c) = creds else { return };
    put_secret(secrets, "cloudstack_secret_access_key", c.secret_access_key.expose());
}

pub(super) fn validate(creds: &IaasCredentials) -> Result<(), BblError> {
    let IaasCredentials::CloudStack(c) = creds else { return Ok(()) };
    if !(c.endpoint.starts_with("https://") || c.endpoint.starts_with("http://")) {
        return Err(BblError::UserInput(format!(
            "--cloudstack-endpoint {:?} must be an http(s) URL",
            c.endpoint
        )));
    }
    Ok(())
}
