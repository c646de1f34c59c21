// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bbl up --no-director` against a scripted terraform.

use crate::prelude::*;

#[test]
fn up_records_the_provisioner_state() {
    let env = Env::new();
    env.gcp_up().passes().stderr_has("spec-env");

    similar_asserts::assert_eq!(env.terraform_calls(), vec!["version", "init", "apply", "output"]);
    let state = env.state();
    assert_eq!(state["envID"], "spec-env");
    assert_eq!(state["iaas"], "gcp");
    assert_eq!(state["tfState"], r#"{"version":4,"resources":["network"]}"#);
    assert_eq!(state["latestTFOutput"]["external_ip"], "35.1.2.3");
    assert!(env.state_dir().join("terraform").join("template.tf").exists());
}

#[test]
fn second_up_is_a_no_op() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["up"]).passes();

    let applies = env.terraform_calls().iter().filter(|c| *c == "apply").count();
    assert_eq!(applies, 1);
}

#[test]
fn stored_environment_cannot_change_iaas() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["up", "--iaas", "aws"]).fails_with(1).stderr_has("cannot be switched");
}

#[test]
fn failed_apply_keeps_partial_state_and_resumes() {
    let env = Env::new();
    env.gcp_up()
        .env("FAKE_TF_FAIL", "apply")
        .fails_with(2)
        .stderr_has("terraform apply failed")
        .stderr_has("quota exceeded");
    assert_eq!(env.state()["tfState"], r#"{"version":4,"resources":["partial"]}"#);

    env.bbl().args(&["up"]).passes();
    assert_eq!(env.state()["tfState"], r#"{"version":4,"resources":["network"]}"#);
}

#[test]
fn credentials_never_reach_the_logs() {
    let env = Env::new();
    env.gcp_up()
        .args(&["--debug"])
        .passes()
        .stderr_has("TF_VAR_")
        .stderr_has("[REDACTED]")
        .lacks("gcp-private-key-material");

    let template = std::fs::read_to_string(env.state_dir().join("terraform").join("vars.tfvars"))
        .unwrap();
    assert!(!template.contains("gcp-private-key-material"));
}
