// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bbl destroy`.

use crate::prelude::*;

#[test]
fn destroy_of_an_empty_directory_removes_it() {
    let env = Env::new();
    std::fs::create_dir_all(env.state_dir()).unwrap();
    env.bbl().args(&["destroy"]).passes();

    assert!(!env.state_dir().exists());
    assert!(env.terraform_calls().is_empty());
}

#[test]
fn destroy_tears_down_the_network() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["destroy", "--no-confirm"]).passes();

    assert_eq!(env.terraform_calls().last().map(String::as_str), Some("destroy"));
    assert!(!env.state_dir().exists());
}

#[test]
fn declining_the_prompt_keeps_everything() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["destroy"]).stdin("no\n").passes().stderr_has("Are you sure");

    assert!(!env.terraform_calls().contains(&"destroy".to_string()));
    assert_eq!(env.state()["envID"], "spec-env");
}

#[test]
fn confirming_the_prompt_destroys() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl().args(&["destroy"]).stdin("yes\n").passes();
    assert!(!env.state_dir().exists());
}

#[test]
fn failed_destroy_keeps_the_state() {
    let env = Env::new();
    env.gcp_up().passes();
    env.bbl()
        .args(&["destroy", "--no-confirm"])
        .env("FAKE_TF_FAIL", "destroy")
        .fails_with(2)
        .stderr_has("re-run");

    assert_eq!(env.state()["tfState"], r#"{"version":4,"resources":["partial"]}"#);
}
