// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single values read from the stored state.

use anyhow::Result;
use bbl_core::{BblError, State};
use bbl_engine::deployer;

use super::CliEngine;
use crate::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    EnvId,
    JumpboxAddress,
    DirectorAddress,
    DirectorUsername,
    DirectorPassword,
    DirectorCaCert,
    SshKey,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::EnvId => "env id",
            Field::JumpboxAddress => "jumpbox address",
            Field::DirectorAddress => "director address",
            Field::DirectorUsername => "director username",
            Field::DirectorPassword => "director password",
            Field::DirectorCaCert => "director CA certificate",
            Field::SshKey => "jumpbox SSH key",
        }
    }

    fn is_director(self) -> bool {
        matches!(
            self,
            Field::DirectorAddress
                | Field::DirectorUsername
                | Field::DirectorPassword
                | Field::DirectorCaCert
        )
    }
}

pub fn value(state: &State, field: Field) -> Result<String, BblError> {
    if field.is_director() && state.no_director {
        return Err(BblError::UserInput(format!(
            "the {} is unavailable: this environment was created with --no-director",
            field.label()
        )));
    }
    let value = match field {
        Field::EnvId => state.env_id.clone(),
        Field::JumpboxAddress => state.jumpbox.url.clone(),
        Field::DirectorAddress => state.director.address.clone(),
        Field::DirectorUsername => state.director.username.clone(),
        Field::DirectorPassword => state.director.password.expose().to_string(),
        Field::DirectorCaCert => state.director.ssl_ca.clone(),
        Field::SshKey => deployer::jumpbox_private_key(state)?.unwrap_or_default(),
    };
    if value.is_empty() {
        return Err(BblError::UserInput(format!(
            "could not retrieve the {}; make sure --state-dir points at a bbl environment",
            field.label()
        )));
    }
    Ok(value)
}

pub fn print(engine: &CliEngine, field: Field) -> Result<()> {
    output::print_document(&value(&engine.state()?, field)?);
    Ok(())
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
