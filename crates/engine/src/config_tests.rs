// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{provisioned, temp_store, VARS_STORE};
use bbl_adapters::{FakeConnector, FakeDirectorCall};
use bbl_core::{Iaas, LbType};

fn deployed(iaas: Iaas) -> State {
    let mut state = provisioned(iaas, "test");
    state.jumpbox.enabled = true;
    state.jumpbox.url = "35.1.2.3:22".into();
    state.jumpbox.variables = Secret::new(VARS_STORE);
    state.director.deployed = true;
    state.director.address = "https://10.0.0.6:25555".into();
    state.director.username = "admin".into();
    state.director.password = Secret::new("admin-password-value");
    state
}

#[test]
fn cloud_config_follows_lb_type() {
    let mut state = provisioned(Iaas::Gcp, "test");
    let plain = cloud_config(&state).unwrap();
    state.lb.lb_type = LbType::Concourse;
    let with_lb = cloud_config(&state).unwrap();
    assert_ne!(plain, with_lb);
    assert!(with_lb.contains("concourse_target_pool-value"));
}

#[test]
fn runtime_config_is_seeded_once() {
    let (_tmp, store) = temp_store();
    let seeded = runtime_config(&store).unwrap();
    assert_eq!(seeded, assets::get(RUNTIME_CONFIG).unwrap());

    let path = store.dir().join("bosh-deployment").join(RUNTIME_CONFIG);
    std::fs::write(&path, "addons: []\n").unwrap();
    assert_eq!(runtime_config(&store).unwrap(), "addons: []\n");
}

#[test]
fn target_needs_a_director() {
    let state = provisioned(Iaas::Gcp, "test");
    assert!(matches!(director_target(&state), Err(BblError::UserInput(_))));

    let target = director_target(&deployed(Iaas::Gcp)).unwrap();
    assert_eq!(target.address, "https://10.0.0.6:25555");
    assert_eq!(target.jumpbox_url, "35.1.2.3:22");
    assert!(target.jumpbox_private_key.expose().contains("jumpbox-private-key"));
}

#[tokio::test]
async fn apply_uploads_cloud_then_runtime() {
    let (_tmp, store) = temp_store();
    let connector = FakeConnector::new();
    let mut state = deployed(Iaas::Aws);

    ConfigApplier::new(connector.clone()).apply(&store, &mut state).await.unwrap();

    assert!(state.director.config_applied);
    let configs = connector.director.configs();
    let kinds: Vec<_> = configs.iter().map(|(k, n, _)| (k.as_str(), n.as_str())).collect();
    assert_eq!(kinds, vec![("cloud", "default"), ("runtime", "dns")]);
    assert_eq!(configs[0].2, cloud_config(&state).unwrap());

    let saved = std::fs::read_to_string(store.dir().join(CLOUD_CONFIG_DIR).join(CLOUD_CONFIG_FILE)).unwrap();
    assert_eq!(saved, configs[0].2);
    assert!(matches!(
        &connector.director.calls()[0],
        FakeDirectorCall::Connect { jumpbox_url, .. } if jumpbox_url == "35.1.2.3:22"
    ));
}

#[tokio::test]
async fn failed_upload_leaves_flag_unset() {
    let (_tmp, store) = temp_store();
    let connector = FakeConnector::new();
    connector.director.set_fail_updates(true);
    let mut state = deployed(Iaas::Gcp);

    let err = ConfigApplier::new(connector).apply(&store, &mut state).await.unwrap_err();
    assert!(matches!(err, BblError::CloudApi(_)));
    assert!(!state.director.config_applied);
}

#[tokio::test]
async fn unreachable_jumpbox_is_transport() {
    let (_tmp, store) = temp_store();
    let connector = FakeConnector::new();
    connector.director.set_unreachable(true);
    let mut state = deployed(Iaas::Gcp);

    let err = ConfigApplier::new(connector).apply(&store, &mut state).await.unwrap_err();
    assert!(matches!(err, BblError::Transport(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn deployments_are_listed() {
    let connector = FakeConnector::new();
    connector.director.set_deployments(&["cf", "concourse"]);
    let target = director_target(&deployed(Iaas::Gcp)).unwrap();

    let names = ConfigApplier::new(connector).deployments(&target).await.unwrap();
    assert_eq!(names, vec!["cf", "concourse"]);
}
