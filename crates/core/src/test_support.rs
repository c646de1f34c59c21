// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures and proptest strategies shared with other crates' tests.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::{
    AwsCredentials, Director, GcpCredentials, Iaas, IaasCredentials, Jumpbox, KeyPair, Lb, LbType,
    Secret, State, CURRENT_SCHEMA_VERSION,
};

/// GCP state as produced by a first `bbl up --iaas gcp --name <env_id>`.
pub fn gcp_state(env_id: &str) -> State {
    State {
        iaas: Some(Iaas::Gcp),
        iaas_credentials: Some(IaasCredentials::Gcp(GcpCredentials {
            service_account_key: Secret::new(
                r#"{"type":"service_account","project_id":"some-project","private_key":"gcp-private-key-material"}"#,
            ),
            project_id: "some-project".into(),
            region: "us-west1".into(),
            zone: "us-west1-a".into(),
        })),
        ..State::new(env_id)
    }
}

pub fn aws_state(env_id: &str) -> State {
    State {
        iaas: Some(Iaas::Aws),
        iaas_credentials: Some(IaasCredentials::Aws(AwsCredentials {
            access_key_id: "AKIAEXAMPLEKEY".into(),
            secret_access_key: Secret::new("aws-secret-access-key-value"),
            region: "us-east-1".into(),
        })),
        ..State::new(env_id)
    }
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _:./{}\"-]{0,24}"
}

fn arb_lb() -> impl Strategy<Value = Lb> {
    (
        prop_oneof![Just(LbType::None), Just(LbType::Concourse), Just(LbType::Cf)],
        arb_text(),
        arb_text(),
        arb_text(),
    )
        .prop_map(|(lb_type, cert, key, domain)| Lb {
            lb_type,
            cert,
            key: Secret::new(key),
            chain: String::new(),
            domain,
        })
}

fn arb_credentials() -> impl Strategy<Value = Option<IaasCredentials>> {
    prop_oneof![
        Just(None),
        (arb_text(), arb_text(), arb_text()).prop_map(|(id, secret, region)| Some(
            IaasCredentials::Aws(AwsCredentials {
                access_key_id: id,
                secret_access_key: Secret::new(secret),
                region,
            })
        )),
        (arb_text(), arb_text(), arb_text()).prop_map(|(key, project, zone)| Some(
            IaasCredentials::Gcp(GcpCredentials {
                service_account_key: Secret::new(key),
                project_id: project,
                region: "us-west1".into(),
                zone,
            })
        )),
    ]
}

/// Arbitrary well-formed state documents (no floats, so JSON is exact).
pub fn arb_state() -> impl Strategy<Value = State> {
    (
        "[a-z][a-z0-9-]{0,40}",
        arb_credentials(),
        arb_text(),
        any::<bool>(),
        (arb_text(), arb_text(), arb_text(), any::<bool>()),
        (arb_text(), arb_text()),
        arb_lb(),
        proptest::collection::btree_map("[a-z_]{1,12}", arb_text(), 0..4),
    )
        .prop_map(
            |(env_id, creds, tf_state, no_director, director, jumpbox, lb, outputs)| {
                let (address, password, variables, deployed) = director;
                let deployed = deployed && !tf_state.is_empty();
                State {
                    schema_version: CURRENT_SCHEMA_VERSION,
                    env_id,
                    iaas: creds.as_ref().map(IaasCredentials::iaas),
                    iaas_credentials: creds,
                    no_director,
                    tf_state,
                    tf_inputs_hash: String::new(),
                    director: Director {
                        address,
                        username: "admin".into(),
                        password: Secret::new(password),
                        variables: Secret::new(variables),
                        deployed,
                        ..Director::default()
                    },
                    jumpbox: Jumpbox {
                        url: jumpbox.0,
                        variables: Secret::new(jumpbox.1),
                        enabled: deployed,
                        ..Jumpbox::default()
                    },
                    key_pair: KeyPair::default(),
                    lb,
                    latest_tf_output: outputs
                        .into_iter()
                        .map(|(k, v)| (k, serde_json::Value::String(v)))
                        .collect::<BTreeMap<_, _>>(),
                }
            },
        )
}
