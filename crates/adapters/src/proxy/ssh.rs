// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH leg of the jumpbox proxy.
//!
//! The jumpbox host key is learned with a throwaway handshake and then
//! pinned for the real session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use russh::client;
use russh_keys::key::{KeyPair, PublicKey};

use super::socks5::{BoxedStream, Dialer};
use super::ProxyError;

/// Dial and handshake deadline.
pub const SSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Records the presented host key, then refuses it.
struct HostKeyCapture {
    seen: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl client::Handler for HostKeyCapture {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        *self.seen.lock() = Some(key.fingerprint());
        Ok(false)
    }
}

/// Accepts exactly one host key.
struct PinnedHostKey {
    fingerprint: String,
}

#[async_trait]
impl client::Handler for PinnedHostKey {
    type Error = russh::Error;

    async fn check_server_key(&mut self, key: &PublicKey) -> Result<bool, Self::Error> {
        let matches = key.fingerprint() == self.fingerprint;
        if !matches {
            tracing::warn!(expected = %self.fingerprint, got = %key.fingerprint(), "jumpbox host key changed");
        }
        Ok(matches)
    }
}

pub fn parse_private_key(pem: &str) -> Result<KeyPair, ProxyError> {
    if pem.trim().is_empty() {
        return Err(ProxyError::ParsePrivateKey("jumpbox private key is empty".into()));
    }
    russh_keys::decode_secret_key(pem, None).map_err(|e| ProxyError::ParsePrivateKey(e.to_string()))
}

/// Fingerprint of the host key `addr` presents.
pub async fn discover_host_key(addr: &str) -> Result<String, ProxyError> {
    let seen = Arc::new(Mutex::new(None));
    let handler = HostKeyCapture { seen: Arc::clone(&seen) };
    let config = Arc::new(client::Config::default());

    let attempt = tokio::time::timeout(SSH_TIMEOUT, client::connect(config, addr, handler)).await;
    let captured = seen.lock().take();
    match (captured, attempt) {
        (Some(fingerprint), _) => {
            tracing::debug!(addr, %fingerprint, "discovered jumpbox host key");
            Ok(fingerprint)
        }
        (None, Err(_)) => Err(ProxyError::GetHostKey(format!("{addr}: handshake timed out"))),
        (None, Ok(Err(e))) => Err(ProxyError::GetHostKey(format!("{addr}: {e}"))),
        (None, Ok(Ok(_))) => Err(ProxyError::GetHostKey(format!("{addr}: no host key presented"))),
    }
}

/// Authenticated session to the jumpbox, opening one `direct-tcpip`
/// channel per proxied connection.
pub struct SshDialer {
    handle: client::Handle<PinnedHostKey>,
}

impl SshDialer {
    pub async fn connect(
        addr: &str,
        user: &str,
        key: KeyPair,
        fingerprint: String,
    ) -> Result<Self, ProxyError> {
        let config = Arc::new(client::Config::default());
        let handler = PinnedHostKey { fingerprint };

        let mut handle = tokio::time::timeout(SSH_TIMEOUT, client::connect(config, addr, handler))
            .await
            .map_err(|_| ProxyError::Dial(format!("{addr}: timed out")))?
            .map_err(|e| ProxyError::Dial(format!("{addr}: {e}")))?;

        let accepted =
            tokio::time::timeout(SSH_TIMEOUT, handle.authenticate_publickey(user, Arc::new(key)))
                .await
                .map_err(|_| ProxyError::Dial(format!("{addr}: authentication timed out")))?
                .map_err(|e| ProxyError::Dial(format!("{addr}: {e}")))?;
        if !accepted {
            return Err(ProxyError::Dial(format!("{addr}: public key rejected for user {user}")));
        }

        tracing::info!(addr, user, "connected to jumpbox");
        Ok(Self { handle })
    }
}

#[async_trait]
impl Dialer for SshDialer {
    async fn dial(&self, host: &str, port: u16) -> Result<BoxedStream, ProxyError> {
        let channel = self
            .handle
            .channel_open_direct_tcpip(host, u32::from(port), "127.0.0.1", 0)
            .await
            .map_err(|e| ProxyError::Dial(format!("{host}:{port} via jumpbox: {e}")))?;
        Ok(Box::pin(channel.into_stream()))
    }
}
