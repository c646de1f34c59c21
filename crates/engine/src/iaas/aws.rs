// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_secret, Secrets, Vars};

pub(super) fn inputs(state: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Aws(c) = creds else { return };
    put(vars, "region", c.region.as_str());
    put(vars, "ssh_public_key", state.key_pair.public_key.as_str());
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Aws(c) = creds else { return };
    put_secret(secrets, "access_key", &c.access_key_id);
    put_secret(secrets, "secret_key", c.secret_access_key.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Aws(c) = creds else { return };
    put(vars, "access_key_id", c.access_key_id.as_str());
    put(vars, "region", c.region.as_str());
}

pub(super) fn deploy_secrets(state: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Aws(c) = creds else { return };
    put_secret(secrets, "secret_access_key", c.secret_access_key.expose());
    // The VMs are created with the uploaded key pair; create-env logs in with it.
    put_secret(secrets, "private_key", state.key_pair.private_key.expose());
}

pub(super) fn validate(creds: &IaasCredentials) -> Result<(), BblError> {
    let IaasCredentials::Aws(c) = creds else { return Ok(()) };
    if c.region.contains(char::is_whitespace) {
        return Err(BblError::UserInput(format!("invalid AWS region {:?}", c.region)));
    }
    Ok(())
}
