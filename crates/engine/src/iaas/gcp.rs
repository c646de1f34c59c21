// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bbl_core::{BblError, IaasCredentials, State};

use super::{put, put_secret, Secrets, Vars};

pub(super) fn inputs(state: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Gcp(c) = creds else { return };
    put(vars, "project_id", c.project_id.as_str());
    put(vars, "region", c.region.as_str());
    put(vars, "zone", c.zone.as_str());
    put(vars, "ssh_public_key", state.key_pair.public_key.as_str());
}

pub(super) fn credentials(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Gcp(c) = creds else { return };
    put_secret(secrets, "gcp_credentials_json", c.service_account_key.expose());
}

pub(super) fn deploy_vars(_: &State, creds: &IaasCredentials, vars: &mut Vars) {
    let IaasCredentials::Gcp(c) = creds else { return };
    put(vars, "project_id", c.project_id.as_str());
    put(vars, "zone", c.zone.as_str());
}

pub(super) fn deploy_secrets(_: &State, creds: &IaasCredentials, secrets: &mut Secrets) {
    let IaasCredentials::Gcp(c) = creds else { return };
    put_secret(secrets, "gcp_credentials_json", c.service_account_key.expose());
}

/// The key must be a JSON service account and the zone must sit in the
/// region.
pub(super) fn validate(creds: &IaasCredentials) -> Result<(), BblError> {
    let IaasCredentials::Gcp(c) = creds else { return Ok(()) };
    match serde_json::from_str::<serde_json::Value>(c.service_account_key.expose()) {
        Ok(serde_json::Value::Object(_)) => {}
        // The parse error would echo the key; keep it out of the message.
        _ => {
            return Err(BblError::UserInput(
                "--gcp-service-account-key must be the contents of a JSON service account key"
                    .into(),
            ))
        }
    }
    if !c.zone.starts_with(&format!("{}-", c.region)) {
        return Err(BblError::UserInput(format!(
            "zone {:?} is not in region {:?}",
            c.zone, c.region
        )));
    }
    Ok(())
}
