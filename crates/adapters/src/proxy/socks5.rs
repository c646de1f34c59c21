// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal SOCKS5 server (RFC 1928): no authentication, CONNECT only.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use super::ProxyError;

const VERSION: u8 = 0x05;
const NO_AUTH: u8 = 0x00;
const NO_ACCEPTABLE_METHOD: u8 = 0xFF;
const CMD_CONNECT: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

const REPLY_SUCCEEDED: u8 = 0x00;
const REPLY_GENERAL_FAILURE: u8 = 0x01;
const REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
const REPLY_ADDRESS_NOT_SUPPORTED: u8 = 0x08;

/// Byte stream to a forwarded destination.
pub trait ProxyStream: AsyncRead + AsyncWrite + Send {}
impl<T: AsyncRead + AsyncWrite + Send> ProxyStream for T {}

pub type BoxedStream = Pin<Box<dyn ProxyStream>>;

/// Opens the upstream leg of a proxied connection.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    async fn dial(&self, host: &str, port: u16) -> Result<BoxedStream, ProxyError>;
}

/// Accept loop. Each connection is served on its own task; the loop exits
/// when `cancel` fires.
pub async fn serve(listener: TcpListener, dialer: Arc<dyn Dialer>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((conn, peer)) => {
                    let dialer = Arc::clone(&dialer);
                    tokio::spawn(async move {
                        if let Err(e) = handle(conn, dialer.as_ref()).await {
                            tracing::debug!(%peer, error = %e, "socks5 connection ended");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "socks5 accept failed"),
            },
        }
    }
    tracing::debug!("socks5 proxy stopped");
}

async fn handle(mut conn: TcpStream, dialer: &dyn Dialer) -> Result<(), ProxyError> {
    negotiate(&mut conn).await?;
    let (host, port) = match read_request(&mut conn).await? {
        Ok(target) => target,
        Err(reply) => {
            send_reply(&mut conn, reply).await?;
            return Err(ProxyError::Socks(format!("rejected request (reply {reply:#04x})")));
        }
    };

    let mut upstream = match dialer.dial(&host, port).await {
        Ok(upstream) => upstream,
        Err(e) => {
            send_reply(&mut conn, REPLY_GENERAL_FAILURE).await?;
            return Err(e);
        }
    };
    send_reply(&mut conn, REPLY_SUCCEEDED).await?;
    tracing::debug!(%host, port, "socks5 forwarding");

    tokio::io::copy_bidirectional(&mut conn, &mut upstream).await.map_err(socks_io)?;
    Ok(())
}

fn socks_io(e: std::io::Error) -> ProxyError {
    ProxyError::Socks(e.to_string())
}

async fn negotiate<S: AsyncRead + AsyncWrite + Unpin>(conn: &mut S) -> Result<(), ProxyError> {
    let mut head = [0u8; 2];
    conn.read_exact(&mut head).await.map_err(socks_io)?;
    if head[0] != VERSION {
        return Err(ProxyError::Socks(format!("unsupported version {}", head[0])));
    }
    let mut methods = vec![0u8; usize::from(head[1])];
    conn.read_exact(&mut methods).await.map_err(socks_io)?;

    if !methods.contains(&NO_AUTH) {
        conn.write_all(&[VERSION, NO_ACCEPTABLE_METHOD]).await.map_err(socks_io)?;
        return Err(ProxyError::Socks("client offered no acceptable auth method".into()));
    }
    conn.write_all(&[VERSION, NO_AUTH]).await.map_err(socks_io)
}

/// Parse a request. The inner `Err` is the reply code to refuse it with.
async fn read_request<S: AsyncRead + Unpin>(
    conn: &mut S,
) -> Result<Result<(String, u16), u8>, ProxyError> {
    let mut head = [0u8; 4];
    conn.read_exact(&mut head).await.map_err(socks_io)?;
    let [version, command, _reserved, atyp] = head;
    if version != VERSION {
        return Err(ProxyError::Socks(format!("unsupported version {version}")));
    }

    let host = match atyp {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            conn.read_exact(&mut octets).await.map_err(socks_io)?;
            Ipv4Addr::from(octets).to_string()
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            conn.read_exact(&mut octets).await.map_err(socks_io)?;
            Ipv6Addr::from(octets).to_string()
        }
        ATYP_DOMAIN => {
            let len = conn.read_u8().await.map_err(socks_io)?;
            let mut name = vec![0u8; usize::from(len)];
            conn.read_exact(&mut name).await.map_err(socks_io)?;
            String::from_utf8_lossy(&name).into_owned()
        }
        _ => return Ok(Err(REPLY_ADDRESS_NOT_SUPPORTED)),
    };
    let port = conn.read_u16().await.map_err(socks_io)?;

    if command != CMD_CONNECT {
        return Ok(Err(REPLY_COMMAND_NOT_SUPPORTED));
    }
    Ok(Ok((host, port)))
}

async fn send_reply<S: AsyncWrite + Unpin>(conn: &mut S, code: u8) -> Result<(), ProxyError> {
    // Bound address is not meaningful for a tunnel; report 0.0.0.0:0.
    conn.write_all(&[VERSION, code, 0x00, ATYP_IPV4, 0, 0, 0, 0, 0, 0]).await.map_err(socks_io)
}

#[cfg(test)]
#[path = "socks5_tests.rs"]
mod tests;
