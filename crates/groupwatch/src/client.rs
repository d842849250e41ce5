// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client carrying the session cookie and security token.

use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};

use crate::config::WatchConfig;
use crate::error::{Endpoint, FetchError};

/// Header carrying the anti-forgery token, in both directions.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Base URLs for the three API services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub groups: String,
    pub users: String,
}

impl Endpoints {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            auth: trim_base(&config.auth_url),
            groups: trim_base(&config.groups_url),
            users: trim_base(&config.users_url),
        }
    }

    /// Point every service at one base URL.
    pub fn single(base: &str) -> Self {
        let base = trim_base(base);
        Self { auth: base.clone(), groups: base.clone(), users: base }
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

/// Build the shared `reqwest` client. `timeout` of `None` leaves requests unbounded.
pub fn http_client(timeout: Option<Duration>, user_agent: Option<&str>) -> anyhow::Result<Client> {
    // reqwest is built without a default rustls provider; installing twice is a no-op.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(user_agent) = user_agent {
        builder = builder.user_agent(user_agent);
    }
    Ok(builder.build()?)
}

/// Client for the group and user APIs.
///
/// Owns the session cookie and the security token. The token starts empty and
/// is filled once by [`ApiClient::refresh_security_token`].
pub struct ApiClient {
    http: Client,
    cookie: String,
    csrf_token: String,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(http: Client, cookie: impl Into<String>, endpoints: Endpoints) -> Self {
        Self { http, cookie: cookie.into(), csrf_token: String::new(), endpoints }
    }

    pub fn from_config(config: &WatchConfig) -> anyhow::Result<Self> {
        let http = http_client(config.request_timeout(), Some(&config.user_agent))?;
        Ok(Self::new(http, config.cookie()?, Endpoints::from_config(config)))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Attach the session cookie and security token.
    pub fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(COOKIE, format!(".ROBLOSECURITY={}", self.cookie))
            .header(CSRF_HEADER, self.csrf_token.as_str())
    }

    /// Harvest a security token from the logout endpoint.
    ///
    /// The endpoint rejects the call but always returns a fresh token in the
    /// response headers. A missing token leaves the client in degraded mode:
    /// later authenticated calls may fail with an authorization status.
    pub async fn refresh_security_token(&mut self) -> bool {
        let url = format!("{}/v2/logout", self.endpoints.auth);
        let sent = self.authed(self.http.post(url)).send().await;
        let resp = match sent.map_err(FetchError::transport(Endpoint::TokenBootstrap)) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(err = %e, "failed to update CSRF token");
                return false;
            }
        };

        let token = resp
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        match token {
            Some(token) => {
                self.csrf_token = token;
                tracing::info!("CSRF token updated");
                true
            }
            None => {
                tracing::warn!(status = resp.status().as_u16(), "failed to update CSRF token");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
