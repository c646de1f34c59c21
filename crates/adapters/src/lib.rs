// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bbl-adapters: everything that talks to the outside world
//!
//! External executables go through the [`Runner`] capability so tests can
//! swap in [`FakeRunner`]. The director API goes through
//! [`DirectorConnector`], which starts the jumpbox proxy on first use.

pub mod bosh;
pub mod director;
pub mod proxy;
pub mod retry;
pub mod runner;
pub mod terraform;

pub use bosh::{BoshCli, BoshError, BoshWorkspace};
pub use director::{
    DirectorApi, DirectorConnector, DirectorError, DirectorTarget, HttpDirector, ProxiedConnector,
};
pub use proxy::{JumpboxProxy, ProxyError};
pub use retry::{retry_idempotent, RetryPolicy, Retryable};
pub use runner::{CommandOutput, CommandSpec, Runner, RunnerError, SubprocessRunner};
pub use terraform::{Terraform, TerraformError, TfWorkspace};

#[cfg(any(test, feature = "test-support"))]
pub use director::{FakeConnector, FakeDirector, FakeDirectorCall};
#[cfg(any(test, feature = "test-support"))]
pub use runner::{FakeCall, FakeResponse, FakeRunner};
