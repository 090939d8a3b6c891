// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guarded page fetching.
//!
//! Wraps the raw transport with the crawl's failure policy:
//! - 429 is surfaced as [`CrawlError::RateLimited`] and never retried here;
//!   silently retrying a rate limit risks extending the ban.
//! - Any other status >= 400 gets exactly one blind retry after a short
//!   fixed delay before surfacing as [`CrawlError::ServerError`].
//! - A dropped connection triggers a single session-wide reauthentication
//!   (deduplicated in [`Session`]) and one re-issue of the original
//!   request.

use crate::error::{CrawlError, Result};
use crate::services::session::Session;
use crate::services::transport::{HttpResponse, HttpTransport, TransportError};
use std::sync::Arc;
use std::time::Duration;

/// Fixed delay before the single server-error retry.
const SERVER_ERROR_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Transport guard shared by the walker and every extraction task.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
}

impl PageFetcher {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            transport: Arc::clone(session.transport()),
            session,
        }
    }

    /// Fetch a page body through the failure policy.
    pub async fn fetch(&self, uri: &str) -> Result<String> {
        let response = match self.transport.get(uri).await {
            Ok(response) => response,
            Err(TransportError::Disconnected(cause)) => {
                tracing::info!(uri, %cause, "connection dropped, reauthenticating");
                self.session.reauthenticate().await?;

                // Re-issue the original request exactly once.
                self.transport
                    .get(uri)
                    .await
                    .map_err(|e| CrawlError::Transport(e.to_string()))?
            }
        };

        self.classify(uri, response).await
    }

    /// Map a response status onto the crawl error taxonomy, retrying a
    /// server error exactly once.
    async fn classify(&self, uri: &str, response: HttpResponse) -> Result<String> {
        match response.status {
            429 => {
                tracing::warn!(uri, "rate limit hit (429)");
                Err(CrawlError::RateLimited)
            }
            status if status >= 400 => {
                tracing::warn!(uri, status, "server error, retrying once");
                tokio::time::sleep(SERVER_ERROR_RETRY_DELAY).await;

                let retry = self
                    .transport
                    .get(uri)
                    .await
                    .map_err(|e| CrawlError::Transport(e.to_string()))?;

                match retry.status {
                    429 => {
                        tracing::warn!(uri, "rate limit hit (429)");
                        Err(CrawlError::RateLimited)
                    }
                    status if status >= 400 => Err(CrawlError::ServerError(status)),
                    _ => Ok(retry.body),
                }
            }
            _ => Ok(response.body),
        }
    }
}
