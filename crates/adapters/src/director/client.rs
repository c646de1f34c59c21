// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bbl_core::Secret;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{DirectorApi, DirectorError, DirectorTarget};
use crate::retry::{retry_idempotent, RetryPolicy};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
struct Info {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    user_authentication: Option<UserAuthentication>,
}

#[derive(Debug, Deserialize)]
struct UserAuthentication {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    options: AuthOptions,
}

#[derive(Debug, Default, Deserialize)]
struct AuthOptions {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    name: String,
}

#[derive(Debug, Clone)]
enum Auth {
    Basic,
    Bearer(String),
}

/// Director REST client.
///
/// Authentication is negotiated on first use from `GET /info`: a UAA
/// client-credentials token when the director advertises UAA, HTTP basic
/// auth otherwise.
pub struct HttpDirector {
    http: reqwest::Client,
    address: String,
    username: String,
    password: Secret,
    policy: RetryPolicy,
    auth: OnceCell<Auth>,
}

impl HttpDirector {
    /// Client for `target`, tunnelled through the SOCKS5 proxy at `proxy`
    /// when given. Hostnames resolve on the far side (`socks5h`).
    pub fn new(target: &DirectorTarget, proxy: Option<SocketAddr>) -> Result<Self, DirectorError> {
        let config = |e: reqwest::Error| DirectorError::Config(e.to_string());

        let mut builder =
            reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT).timeout(REQUEST_TIMEOUT);
        builder = match proxy {
            Some(addr) => builder.proxy(reqwest::Proxy::all(format!("socks5h://{addr}")).map_err(config)?),
            None => builder.no_proxy(),
        };
        if !target.ca_cert.trim().is_empty() {
            let cert = reqwest::Certificate::from_pem(target.ca_cert.as_bytes()).map_err(config)?;
            builder = builder.add_root_certificate(cert);
        }

        Ok(Self {
            http: builder.build().map_err(config)?,
            address: target.address.trim_end_matches('/').to_string(),
            username: target.username.clone(),
            password: target.password.clone(),
            policy: RetryPolicy::default(),
            auth: OnceCell::new(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn transport(&self, e: reqwest::Error) -> DirectorError {
        if e.is_decode() {
            return DirectorError::Decode(e.to_string());
        }
        DirectorError::Unreachable { address: self.address.clone(), message: e.to_string() }
    }

    async fn check(&self, what: &str, resp: reqwest::Response) -> Result<reqwest::Response, DirectorError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DirectorError::Auth(format!("{what}: {}", body.trim())));
        }
        Err(DirectorError::Status { what: what.to_string(), status: status.as_u16(), body: body.trim().to_string() })
    }

    async fn info(&self) -> Result<Info, DirectorError> {
        retry_idempotent(self.policy, "GET /info", || async {
            let resp = self.http.get(self.url("/info")).send().await.map_err(|e| self.transport(e))?;
            let resp = self.check("GET /info", resp).await?;
            resp.json::<Info>().await.map_err(|e| self.transport(e))
        })
        .await
    }

    async fn uaa_token(&self, uaa_url: &str) -> Result<String, DirectorError> {
        let url = format!("{}/oauth/token", uaa_url.trim_end_matches('/'));
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.username.as_str()),
            ("client_secret", self.password.expose()),
        ];
        let resp = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let resp = self.check("POST /oauth/token", resp).await.map_err(|e| match e {
            DirectorError::Status { status, body, .. } if status == 400 || status == 403 => {
                DirectorError::Auth(format!("UAA rejected client {}: {body}", self.username))
            }
            other => other,
        })?;
        let token: Token = resp.json().await.map_err(|e| self.transport(e))?;
        Ok(token.access_token)
    }

    async fn auth(&self) -> Result<&Auth, DirectorError> {
        self.auth
            .get_or_try_init(|| async {
                let info = self.info().await?;
                tracing::debug!(name = %info.name, version = %info.version, "director info");
                match info.user_authentication {
                    Some(ua) if ua.kind == "uaa" && !ua.options.url.is_empty() => {
                        Ok(Auth::Bearer(self.uaa_token(&ua.options.url).await?))
                    }
                    _ => Ok(Auth::Basic),
                }
            })
            .await
    }

    async fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, DirectorError> {
        let req = self.http.request(method, self.url(path));
        Ok(match self.auth().await? {
            Auth::Basic => req.basic_auth(&self.username, Some(self.password.expose())),
            Auth::Bearer(token) => req.bearer_auth(token),
        })
    }
}

#[async_trait]
impl DirectorApi for HttpDirector {
    async fn update_config(&self, kind: &str, name: &str, content: &str) -> Result<(), DirectorError> {
        let body = serde_json::json!({ "type": kind, "name": name, "content": content });
        let resp = self
            .request(reqwest::Method::POST, "/configs")
            .await?
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.check("POST /configs", resp).await?;
        tracing::info!(kind, name, "updated director config");
        Ok(())
    }

    async fn deployments(&self) -> Result<Vec<String>, DirectorError> {
        // Negotiate auth first so its own retries don't nest inside these.
        self.auth().await?;
        retry_idempotent(self.policy, "GET /deployments", || async {
            let resp = self
                .request(reqwest::Method::GET, "/deployments")
                .await?
                .send()
                .await
                .map_err(|e| self.transport(e))?;
            let resp = self.check("GET /deployments", resp).await?;
            let deployments: Vec<Deployment> = resp.json().await.map_err(|e| self.transport(e))?;
            Ok(deployments.into_iter().map(|d| d.name).collect())
        })
        .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
