// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Director API access, routed through the jumpbox proxy.

mod client;

use std::sync::Arc;

use async_trait::async_trait;
use bbl_core::{BblError, Secret};
use thiserror::Error;

use crate::proxy::{JumpboxProxy, ProxyError};
use crate::retry::Retryable;

pub use client::{HttpDirector, CONNECT_TIMEOUT, REQUEST_TIMEOUT};

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error("director at {address} is unreachable: {message}")]
    Unreachable { address: String, message: String },
    #[error("director returned {status} for {what}: {body}")]
    Status { what: String, status: u16, body: String },
    #[error("director authentication failed: {0}")]
    Auth(String),
    #[error("unexpected director response: {0}")]
    Decode(String),
    #[error("invalid director client configuration: {0}")]
    Config(String),
}

impl Retryable for DirectorError {
    fn is_retryable(&self) -> bool {
        match self {
            DirectorError::Unreachable { .. } => true,
            DirectorError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<DirectorError> for BblError {
    fn from(err: DirectorError) -> Self {
        match err {
            DirectorError::Proxy(e) => e.into(),
            DirectorError::Unreachable { .. } | DirectorError::Config(_) => {
                BblError::Transport(err.to_string())
            }
            DirectorError::Status { .. } | DirectorError::Auth(_) | DirectorError::Decode(_) => {
                BblError::CloudApi(err.to_string())
            }
        }
    }
}

/// Everything needed to reach and authenticate to a director.
#[derive(Debug, Clone, Default)]
pub struct DirectorTarget {
    /// `https://<ip>:25555`
    pub address: String,
    pub username: String,
    pub password: Secret,
    pub ca_cert: String,
    /// `host:port` of the jumpbox SSH endpoint.
    pub jumpbox_url: String,
    pub jumpbox_private_key: Secret,
}

/// Director operations bbl needs.
#[async_trait]
pub trait DirectorApi: Send + Sync {
    /// Upload a config of `kind` (`cloud`, `runtime`) under `name`.
    async fn update_config(&self, kind: &str, name: &str, content: &str) -> Result<(), DirectorError>;

    /// Names of deployments the director manages.
    async fn deployments(&self) -> Result<Vec<String>, DirectorError>;
}

/// Produces a director client, bringing up whatever transport it needs.
#[async_trait]
pub trait DirectorConnector: Clone + Send + Sync + 'static {
    async fn connect(&self, target: &DirectorTarget) -> Result<Arc<dyn DirectorApi>, DirectorError>;

    /// Tear down the transport. Safe to call when never connected.
    async fn disconnect(&self);
}

/// Production connector: HTTPS through the jumpbox SOCKS5 proxy.
#[derive(Clone, Default)]
pub struct ProxiedConnector {
    proxy: Arc<JumpboxProxy>,
}

impl ProxiedConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectorConnector for ProxiedConnector {
    async fn connect(&self, target: &DirectorTarget) -> Result<Arc<dyn DirectorApi>, DirectorError> {
        let addr = self.proxy.start(&target.jumpbox_url, target.jumpbox_private_key.expose()).await?;
        Ok(Arc::new(HttpDirector::new(target, Some(addr))?))
    }

    async fn disconnect(&self) {
        self.proxy.stop().await;
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DirectorApi, DirectorConnector, DirectorError, DirectorTarget};
    use crate::proxy::ProxyError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded director call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum FakeDirectorCall {
        Connect { address: String, jumpbox_url: String },
        UpdateConfig { kind: String, name: String, content: String },
        Deployments,
        Disconnect,
    }

    #[derive(Default)]
    struct FakeDirectorState {
        calls: Vec<FakeDirectorCall>,
        deployments: Vec<String>,
        unreachable: bool,
        fail_updates: bool,
    }

    /// Fake director and connector for testing
    #[derive(Clone, Default)]
    pub struct FakeDirector {
        inner: Arc<Mutex<FakeDirectorState>>,
    }

    impl FakeDirector {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<FakeDirectorCall> {
            self.inner.lock().calls.clone()
        }

        /// Uploaded configs as `(kind, name, content)`.
        pub fn configs(&self) -> Vec<(String, String, String)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    FakeDirectorCall::UpdateConfig { kind, name, content } => Some((kind, name, content)),
                    _ => None,
                })
                .collect()
        }

        pub fn set_deployments(&self, names: &[&str]) {
            self.inner.lock().deployments = names.iter().map(|s| s.to_string()).collect();
        }

        /// Make `connect` fail as if the jumpbox could not be dialed.
        pub fn set_unreachable(&self, unreachable: bool) {
            self.inner.lock().unreachable = unreachable;
        }

        pub fn set_fail_updates(&self, fail: bool) {
            self.inner.lock().fail_updates = fail;
        }
    }

    #[async_trait]
    impl DirectorApi for FakeDirector {
        async fn update_config(&self, kind: &str, name: &str, content: &str) -> Result<(), DirectorError> {
            let mut inner = self.inner.lock();
            inner.calls.push(FakeDirectorCall::UpdateConfig {
                kind: kind.to_string(),
                name: name.to_string(),
                content: content.to_string(),
            });
            if inner.fail_updates {
                return Err(DirectorError::Status {
                    what: "POST /configs".into(),
                    status: 500,
                    body: "internal error".into(),
                });
            }
            Ok(())
        }

        async fn deployments(&self) -> Result<Vec<String>, DirectorError> {
            let mut inner = self.inner.lock();
            inner.calls.push(FakeDirectorCall::Deployments);
            Ok(inner.deployments.clone())
        }
    }

    /// Connector handing out a shared [`FakeDirector`].
    #[derive(Clone, Default)]
    pub struct FakeConnector {
        pub director: FakeDirector,
    }

    impl FakeConnector {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl DirectorConnector for FakeConnector {
        async fn connect(&self, target: &DirectorTarget) -> Result<Arc<dyn DirectorApi>, DirectorError> {
            let mut inner = self.director.inner.lock();
            inner.calls.push(FakeDirectorCall::Connect {
                address: target.address.clone(),
                jumpbox_url: target.jumpbox_url.clone(),
            });
            if inner.unreachable {
                return Err(ProxyError::Dial(format!("{}: connection refused", target.jumpbox_url)).into());
            }
            drop(inner);
            Ok(Arc::new(self.director.clone()))
        }

        async fn disconnect(&self) {
            self.director.inner.lock().calls.push(FakeDirectorCall::Disconnect);
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnector, FakeDirector, FakeDirectorCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
