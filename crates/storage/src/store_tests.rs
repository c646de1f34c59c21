// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bbl_core::test_support::{arb_state, gcp_state};
use bbl_core::Iaas;
use proptest::prelude::*;
use std::os::unix::fs::PermissionsExt;
use tempfile::tempdir;

#[test]
fn get_on_empty_dir_returns_fresh_state() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();

    let state = store.get().unwrap();
    assert_eq!(state, State::default());
    assert!(!store.state_path().exists());
}

#[test]
fn set_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    let mut state = gcp_state("test");
    state.tf_state = r#"{"k":"v"}"#.into();

    store.set(&state).unwrap();
    assert_eq!(store.get().unwrap(), state);
    assert!(!dir.path().join("bbl-state.json.tmp").exists());

    let mode = fs::metadata(store.state_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn second_open_is_already_in_use_and_writes_nothing() {
    let dir = tempdir().unwrap();
    let first = StateStore::open(dir.path()).unwrap();
    first.set(&gcp_state("test")).unwrap();
    let before = fs::read(first.state_path()).unwrap();
    let entries_before = fs::read_dir(dir.path()).unwrap().count();

    let err = StateStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyInUse(_)), "got {err:?}");
    assert_eq!(BblError::from(err).exit_code(), 1);

    assert_eq!(fs::read(first.state_path()).unwrap(), before);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), entries_before);
}

#[test]
fn lock_is_released_on_drop() {
    let dir = tempdir().unwrap();
    drop(StateStore::open(dir.path()).unwrap());
    StateStore::open(dir.path()).unwrap();
}

#[test]
fn corrupt_file_is_reported_not_healed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();
    let store = StateStore::open(dir.path()).unwrap();

    let err = store.get().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert_eq!(fs::read_to_string(dir.path().join(STATE_FILE)).unwrap(), "{not json");
    assert_eq!(BblError::from(err).exit_code(), 3);
}

#[test]
fn too_new_file_is_corrupt_kind() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(STATE_FILE), r#"{"schemaVersion": 42}"#).unwrap();
    let store = StateStore::open(dir.path()).unwrap();

    let err = store.get().unwrap_err();
    assert!(matches!(err, StoreError::Migration { source: MigrationError::TooNew(42, 3), .. }));
    assert_eq!(BblError::from(err).exit_code(), 3);
}

#[test]
fn unknown_fields_are_ignored() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join(STATE_FILE),
        r#"{"schemaVersion": 3, "envID": "env", "iaas": "gcp", "someFutureField": [1, 2]}"#,
    )
    .unwrap();
    let store = StateStore::open(dir.path()).unwrap();

    let state = store.get().unwrap();
    assert_eq!(state.env_id, "env");
    assert_eq!(state.iaas, Some(Iaas::Gcp));
}

#[test]
fn legacy_document_is_migrated_on_read() {
    let legacy = serde_json::json!({
        "envID": "old-env",
        "iaas": "aws",
        "tfState": "{}",
        "bosh": {"address": "https://10.0.0.6:25555", "username": "admin", "deployed": false},
        "jumpbox": {"url": "1.2.3.4:22"},
        "lb": {"type": ""},
    });
    let state = migrate(legacy).unwrap();

    assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(state.director.address, "https://10.0.0.6:25555");
    assert_eq!(state.director.username, "admin");
    assert!(state.jumpbox.enabled);
}

#[yare::parameterized(
    vars     = { "vars" },
    tf       = { "terraform" },
    director = { "bosh-deployment" },
    jumpbox  = { "jumpbox-deployment" },
    cloud    = { "cloud-config" },
    runtime  = { "runtime-configs" },
)]
fn get_dir_creates_private_directory(name: &str) {
    let dir = tempdir().unwrap();
    let store = StateStore::open(dir.path()).unwrap();

    let path = store.get_dir(name).unwrap();
    assert_eq!(path, dir.path().join(name));
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);

    // Idempotent
    assert_eq!(store.get_dir(name).unwrap(), path);
}

#[test]
fn destroy_removes_the_directory() {
    let parent = tempdir().unwrap();
    let dir = parent.path().join("state");
    let store = StateStore::open(&dir).unwrap();
    store.set(&gcp_state("test")).unwrap();
    let tf = store.get_dir("terraform").unwrap();
    fs::write(tf.join("template.tf"), "").unwrap();

    store.destroy().unwrap();
    assert!(!dir.exists());
}

#[test]
fn destroy_keeps_foreign_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "mine").unwrap();
    let store = StateStore::open(dir.path()).unwrap();
    store.set(&gcp_state("test")).unwrap();

    store.destroy().unwrap();
    assert!(dir.path().join("notes.txt").exists());
    assert!(!dir.path().join(STATE_FILE).exists());
    assert!(!dir.path().join(LOCK_FILE).exists());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn state_round_trip_survives_reopen(state in arb_state()) {
        let dir = tempdir().unwrap();
        let bytes = {
            let store = StateStore::open(dir.path()).unwrap();
            store.set(&state).unwrap();
            fs::read(store.state_path()).unwrap()
        };

        let store = StateStore::open(dir.path()).unwrap();
        let read = store.get().unwrap();
        prop_assert_eq!(&read, &state);

        store.set(&read).unwrap();
        prop_assert_eq!(fs::read(store.state_path()).unwrap(), bytes);
    }
}
