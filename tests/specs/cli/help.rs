// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help, version and argument validation.

use crate::prelude::*;

#[test]
fn help_lists_the_lifecycle_commands() {
    let env = Env::new();
    env.bbl()
        .args(&["--help"])
        .passes()
        .stdout_has("up")
        .stdout_has("destroy")
        .stdout_has("print-env")
        .stdout_has("create-lbs");
}

#[test]
fn version_prints_the_crate_version() {
    let env = Env::new();
    env.bbl().args(&["version"]).passes().stdout_has(&format!("bbl {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_is_a_user_error() {
    let env = Env::new();
    env.bbl().fails_with(1).stderr_has("Usage:");
}

#[test]
fn unknown_iaas_is_a_user_error() {
    let env = Env::new();
    env.bbl().args(&["up", "--iaas", "digitalocean"]).fails_with(1).stderr_has("digitalocean");
}

#[test]
fn up_without_an_iaas_is_a_user_error() {
    let env = Env::new();
    env.bbl().args(&["up"]).fails_with(1).stderr_has("must be provided");
    assert!(env.terraform_calls().is_empty());
}

#[test]
fn incomplete_credentials_name_the_missing_flags() {
    let env = Env::new();
    env.bbl()
        .args(&["up", "--iaas", "aws"])
        .env("BBL_AWS_REGION", "us-east-1")
        .fails_with(1)
        .stderr_has("--aws-access-key-id")
        .stderr_has("--aws-secret-access-key");
}
