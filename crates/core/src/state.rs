// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state document: sole source of truth between invocations.
//!
//! Serialized as JSON into `bbl-state.json`. Every map is a `BTreeMap` so the
//! encoding is deterministic and a read/write cycle is byte-stable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BblError, Iaas, IaasCredentials, Secret};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(rename = "envID", default)]
    pub env_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iaas: Option<Iaas>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iaas_credentials: Option<IaasCredentials>,
    #[serde(default)]
    pub no_director: bool,
    /// Provisioner state blob, stored verbatim.
    #[serde(default)]
    pub tf_state: String,
    /// Hash of the template and vars of the last successful apply.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tf_inputs_hash: String,
    #[serde(default)]
    pub director: Director,
    #[serde(default)]
    pub jumpbox: Jumpbox,
    #[serde(default)]
    pub key_pair: KeyPair,
    #[serde(default)]
    pub lb: Lb,
    #[serde(rename = "latestTFOutput", default)]
    pub latest_tf_output: BTreeMap<String, serde_json::Value>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            env_id: String::new(),
            iaas: None,
            iaas_credentials: None,
            no_director: false,
            tf_state: String::new(),
            tf_inputs_hash: String::new(),
            director: Director::default(),
            jumpbox: Jumpbox::default(),
            key_pair: KeyPair::default(),
            lb: Lb::default(),
            latest_tf_output: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Director {
    pub address: String,
    pub username: String,
    pub password: Secret,
    #[serde(rename = "sslCA")]
    pub ssl_ca: String,
    pub manifest: String,
    /// Contents of the deployer's `state.json`.
    pub state: String,
    /// Vars-store YAML written by the deployer.
    pub variables: Secret,
    pub deployed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deployed_hash: String,
    pub config_applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jumpbox {
    /// `host:port` of the jumpbox SSH endpoint.
    pub url: String,
    pub variables: Secret,
    pub manifest: String,
    pub state: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deployed_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: Secret,
}

impl KeyPair {
    pub fn is_empty(&self) -> bool {
        self.public_key.is_empty() || self.private_key.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LbType {
    #[default]
    None,
    Concourse,
    Cf,
}

impl LbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LbType::None => "none",
            LbType::Concourse => "concourse",
            LbType::Cf => "cf",
        }
    }
}

impl fmt::Display for LbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LbType {
    type Err = BblError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(LbType::None),
            "concourse" => Ok(LbType::Concourse),
            "cf" => Ok(LbType::Cf),
            other => Err(BblError::UserInput(format!(
                "unknown lb type {other:?}: expected \"concourse\" or \"cf\""
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lb {
    #[serde(rename = "type")]
    pub lb_type: LbType,
    pub cert: String,
    pub key: Secret,
    pub chain: String,
    pub domain: String,
}

/// Coarse position of an environment in the up/destroy chain.
///
/// `destroy` walks the chain backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Absent,
    /// Provisioner state exists; no jumpbox yet.
    NetworkOnly,
    JumpboxUp,
    DirectorUp,
    /// Cloud-config and runtime-config applied (or no director wanted).
    Steady,
}

impl State {
    /// A fresh document for a new environment.
    pub fn new(env_id: impl Into<String>) -> Self {
        Self { env_id: env_id.into(), ..Self::default() }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.tf_state.is_empty() && !self.jumpbox.enabled && !self.director.deployed {
            return Lifecycle::Absent;
        }
        if self.no_director && !self.tf_state.is_empty() {
            return Lifecycle::Steady;
        }
        if self.director.deployed {
            if self.director.config_applied {
                Lifecycle::Steady
            } else {
                Lifecycle::DirectorUp
            }
        } else if self.jumpbox.enabled && !self.jumpbox.state.is_empty() {
            Lifecycle::JumpboxUp
        } else {
            Lifecycle::NetworkOnly
        }
    }

    /// Whether any cloud resource may still exist.
    pub fn is_provisioned(&self) -> bool {
        !self.tf_state.is_empty() || self.jumpbox.enabled || self.director.deployed
    }

    /// Cross-field invariants a loaded document must satisfy.
    pub fn check_invariants(&self) -> Result<(), BblError> {
        if let (Some(iaas), Some(creds)) = (self.iaas, &self.iaas_credentials) {
            if creds.iaas() != iaas {
                return Err(BblError::InvariantViolation(format!(
                    "state iaas is {iaas} but stored credentials are for {}",
                    creds.iaas()
                )));
            }
        }
        if self.director.deployed {
            if self.tf_state.is_empty() {
                return Err(BblError::InvariantViolation(
                    "state says the director is deployed but no provisioner state exists".into(),
                ));
            }
            if !self.jumpbox.enabled {
                return Err(BblError::InvariantViolation(
                    "state says the director is deployed but the jumpbox is not enabled".into(),
                ));
            }
        }
        Ok(())
    }

    /// Cached provisioner output as a string, if present.
    pub fn output_str(&self, name: &str) -> Option<&str> {
        self.latest_tf_output.get(name).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
    }

    /// Host part of the jumpbox URL.
    pub fn jumpbox_host(&self) -> Option<&str> {
        let url = self.jumpbox.url.as_str();
        if url.is_empty() {
            return None;
        }
        Some(url.rsplit_once(':').map(|(host, _)| host).unwrap_or(url))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
