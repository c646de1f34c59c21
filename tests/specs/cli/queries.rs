// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands that read single values from the state.

use crate::prelude::*;

#[test]
fn queries_on_an_empty_directory_fail() {
    let env = Env::new();
    env.bbl().args(&["env-id"]).fails_with(1).stderr_has("could not retrieve the env id");
    env.bbl().args(&["jumpbox-address"]).fails_with(1);
    env.bbl().args(&["lbs"]).fails_with(1).stderr_has("no load balancers");
}

#[test]
fn queries_read_a_network_only_environment() {
    let env = Env::new();
    env.gcp_up().passes();

    env.bbl().args(&["env-id"]).passes().stdout_has("spec-env");
    let out = env.bbl().args(&["outputs"]).passes();
    let outputs: serde_json::Value = serde_json::from_str(&out.stdout).unwrap();
    assert_eq!(outputs["external_ip"], "35.1.2.3");

    env.bbl()
        .args(&["director-address"])
        .fails_with(1)
        .stderr_has("--no-director");
}

#[test]
fn cloud_config_is_rendered_from_outputs() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["cloud-config"]).passes().stdout_has("azs:").stdout_has("bbl-net");
}

#[test]
fn runtime_config_is_printed() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["runtime-config"]).passes().stdout_has("addons:");
}
