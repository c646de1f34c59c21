// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bbl-engine: bringing an environment up and tearing it down
//!
//! [`Engine`] sequences the provisioner, the two `bosh create-env`
//! deployments and the director configs, checkpointing [`bbl_core::State`]
//! after every external call.

pub mod assets;
pub mod cidr;
pub mod config;
pub mod deployer;
pub mod engine;
pub mod iaas;
pub mod keypair;
pub mod manifest;
pub mod provisioner;

#[cfg(test)]
mod test_helpers;

pub use config::ConfigApplier;
pub use deployer::Deployer;
pub use engine::{DestroyOptions, Engine, EngineConfig, SshTarget, UpOptions};
pub use provisioner::Provisioner;
