// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jumpbox SSH tunnel fronted by a loopback SOCKS5 server.

pub mod socks5;
pub mod ssh;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bbl_core::BblError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

pub use socks5::{BoxedStream, Dialer};

pub const DEFAULT_USER: &str = "jumpbox";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to parse jumpbox private key: {0}")]
    ParsePrivateKey(String),
    #[error("failed to get jumpbox host key: {0}")]
    GetHostKey(String),
    #[error("failed to dial: {0}")]
    Dial(String),
    #[error("failed to open proxy port: {0}")]
    OpenPort(#[source] std::io::Error),
    #[error("socks5: {0}")]
    Socks(String),
}

impl From<ProxyError> for BblError {
    fn from(err: ProxyError) -> Self {
        BblError::Transport(format!("jumpbox proxy: {err}"))
    }
}

struct Running {
    addr: SocketAddr,
    task: JoinHandle<()>,
    // Stops the accept loop if the proxy is dropped without `stop()`.
    guard: DropGuard,
}

/// Lazily started SOCKS5 proxy through the jumpbox.
pub struct JumpboxProxy {
    user: String,
    running: Mutex<Option<Running>>,
}

impl Default for JumpboxProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl JumpboxProxy {
    pub fn new() -> Self {
        Self::with_user(DEFAULT_USER)
    }

    pub fn with_user(user: impl Into<String>) -> Self {
        Self { user: user.into(), running: Mutex::new(None) }
    }

    /// Start the proxy (idempotent) and return its loopback address.
    ///
    /// `jumpbox_url` is `host:port`; `private_key` is the PEM from the
    /// jumpbox vars-store.
    pub async fn start(&self, jumpbox_url: &str, private_key: &str) -> Result<SocketAddr, ProxyError> {
        let user = self.user.clone();
        self.start_with(|| async move {
            let key = ssh::parse_private_key(private_key)?;
            let fingerprint = ssh::discover_host_key(jumpbox_url).await?;
            let dialer = ssh::SshDialer::connect(jumpbox_url, &user, key, fingerprint).await?;
            Ok(Arc::new(dialer) as Arc<dyn Dialer>)
        })
        .await
    }

    /// Start with a caller-supplied upstream. `connect` only runs when the
    /// proxy is not already up.
    pub async fn start_with<F, Fut>(&self, connect: F) -> Result<SocketAddr, ProxyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn Dialer>, ProxyError>>,
    {
        let mut running = self.running.lock().await;
        if let Some(r) = running.as_ref() {
            return Ok(r.addr);
        }

        let dialer = connect().await?;
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.map_err(ProxyError::OpenPort)?;
        let addr = listener.local_addr().map_err(ProxyError::OpenPort)?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(socks5::serve(listener, dialer, cancel.clone()));
        tracing::info!(%addr, "started SOCKS5 proxy");

        *running = Some(Running { addr, task, guard: cancel.drop_guard() });
        Ok(addr)
    }

    pub async fn addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|r| r.addr)
    }

    /// Stop accepting connections. In-flight connections finish on their own.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        drop(running.guard);
        let _ = running.task.await;
        tracing::debug!(addr = %running.addr, "stopped SOCKS5 proxy");
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
