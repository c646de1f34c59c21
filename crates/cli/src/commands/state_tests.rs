// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bbl_core::test_support::gcp_state;
use bbl_core::Secret;

fn deployed() -> State {
    let mut state = gcp_state("bbl-env");
    state.tf_state = r#"{"version":4}"#.into();
    state.jumpbox.enabled = true;
    state.jumpbox.url = "35.1.2.3:22".into();
    state.jumpbox.variables = Secret::new("jumpbox_ssh:\n  private_key: the-jumpbox-key\n");
    state.director.deployed = true;
    state.director.address = "https://10.0.0.6:25555".into();
    state.director.username = "admin".into();
    state.director.password = Secret::new("director-password");
    state.director.ssl_ca = "director-ca".into();
    state
}

#[yare::parameterized(
    env_id   = { Field::EnvId, "bbl-env" },
    jumpbox  = { Field::JumpboxAddress, "35.1.2.3:22" },
    address  = { Field::DirectorAddress, "https://10.0.0.6:25555" },
    username = { Field::DirectorUsername, "admin" },
    password = { Field::DirectorPassword, "director-password" },
    ca       = { Field::DirectorCaCert, "director-ca" },
    ssh_key  = { Field::SshKey, "the-jumpbox-key" },
)]
fn fields_are_read_from_state(field: Field, expected: &str) {
    assert_eq!(value(&deployed(), field).unwrap(), expected);
}

#[test]
fn empty_state_has_no_values() {
    let err = value(&State::default(), Field::JumpboxAddress).unwrap_err();
    assert!(matches!(&err, BblError::UserInput(m) if m.contains("jumpbox address")));
}

#[test]
fn director_fields_are_refused_without_a_director() {
    let mut state = gcp_state("bbl-env");
    state.no_director = true;
    let err = value(&state, Field::DirectorAddress).unwrap_err();
    assert!(matches!(&err, BblError::UserInput(m) if m.contains("--no-director")));
    assert_eq!(value(&state, Field::EnvId).unwrap(), "bbl-env");
}
