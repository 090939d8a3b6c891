// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Raw HTTP transport behind an object-safe trait.
//!
//! The crawl engine only ever needs "send GET/POST, get status + body
//! back"; everything above this seam (status classification, reconnect
//! policy, pagination) is written against [`HttpTransport`] so it can run
//! against a scripted transport in tests.

use async_trait::async_trait;
use std::time::Duration;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failures, i.e. the request never produced a status.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection dropped mid-flight (peer closed, reset, DNS, ...).
    /// The guard reacts by reauthenticating the session once.
    #[error("connection dropped: {0}")]
    Disconnected(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a GET request and return status + body.
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError>;

    /// Perform a form-encoded POST request and return status + body.
    async fn post_form(
        &self,
        uri: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;
}

/// Production transport: a single shared `reqwest` client owning the
/// session cookie jar. All concurrent extraction tasks share this client
/// and therefore the authenticated session.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Disconnected(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, uri: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| TransportError::Disconnected(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }

    async fn post_form(
        &self,
        uri: &str,
        form: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .http
            .post(uri)
            .form(form)
            .send()
            .await
            .map_err(|e| TransportError::Disconnected(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}
