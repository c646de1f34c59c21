// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_secret, Secrets, Vars};

pub(super) fn inputs(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Azure(c) = creds else { return };
    put(vars, "region", c.region.as_str());
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Azure(c) = creds else { return };
    put_secret(secrets, "subscription_id", &c.subscription_id);
    put_secret(secrets, "tenant_id", &c.tenant_id);
    put_secret(secrets, "client_id", &c.client_id);
    put_secret(secrets, "client_secret", c.client_secret.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Azure(c) = creds else { return };
    put(vars, "subscription_id", c.subscription_id.as_str());
    put(vars, "tenant_id", c.tenant_id.as_str());
    put(vars, "client_id", c.client_id.as_str());
}

pub(super) fn deploy_secrets(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Azure(c) = creds else { return };
    put_secret(secrets, "client_secret", c.client_secret.expose());
}

pub(super) fn validate(_: &IaasCredentials) -> Result<(), BblError> {
    Ok(())
}
