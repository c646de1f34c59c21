// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bbl-core: state document and shared vocabulary for the bbl bootstrapper

pub mod credentials;
pub mod env_id;
pub mod error;
pub mod iaas;
pub mod redact;
pub mod secret;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use credentials::{
    AwsCredentials, AzureCredentials, CloudStackCredentials, GcpCredentials, IaasCredentials,
    OpenStackCredentials, VsphereCredentials,
};
pub use env_id::{generate_env_id, short_env_id, validate_env_id, MAX_SHORT_ENV_ID_LEN};
pub use error::{BblError, StateIoKind};
pub use iaas::Iaas;
pub use redact::{strip_control, truncate_log_line, Redactor, REDACTED};
pub use secret::Secret;
pub use state::{
    Director, Jumpbox, KeyPair, Lb, LbType, Lifecycle, State, CURRENT_SCHEMA_VERSION,
};
