// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated session lifecycle.
//!
//! Handles:
//! - Login (CSRF token fetch, credential POST, logged-out-marker check)
//! - Fixed-delay retry with a bounded attempt count
//! - Reconnect after a detected disconnect, deduplicated so N concurrent
//!   callers drive exactly one login sequence

use crate::error::{CrawlError, Result};
use crate::services::extract;
use crate::services::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Login identifier + secret, immutable for the session's lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Authentication state, owned exclusively by [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Failed,
}

/// Login attempts before the session is declared failed.
const LOGIN_ATTEMPTS: u32 = 3;

/// Fixed delay between login attempts, to respect the site's rate policy.
const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(15);

/// How much of a response body is scanned for the logged-out marker.
const LOGIN_MARKER_WINDOW: usize = 500;

/// The authenticated session. All concurrent tasks share one `Session`
/// (and its underlying cookie jar); only this type transitions
/// [`SessionState`].
pub struct Session {
    transport: Arc<dyn HttpTransport>,
    credentials: Credentials,
    base_url: String,
    state: watch::Sender<SessionState>,
    /// Login is not reentrant: at most one login sequence runs at a time.
    login_gate: Mutex<()>,
}

impl Session {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            transport,
            credentials,
            base_url: base_url.into(),
            state,
            login_gate: Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run the login sequence: up to [`LOGIN_ATTEMPTS`] tries with a fixed
    /// inter-attempt delay. Exhaustion marks the session `Failed`, which
    /// callers surface as a fatal [`CrawlError::SessionFailed`].
    pub async fn login(&self) -> Result<()> {
        let _gate = self.login_gate.lock().await;

        // Another caller may have finished logging in while we waited.
        if self.state() == SessionState::Authenticated {
            return Ok(());
        }
        self.state.send_replace(SessionState::Authenticating);

        for attempt in 1..=LOGIN_ATTEMPTS {
            match self.authorize().await {
                Ok(body) => {
                    if self.verify_login(body).await {
                        self.state.send_replace(SessionState::Authenticated);
                        tracing::info!("session established");
                        return Ok(());
                    }
                    tracing::error!(attempt, max = LOGIN_ATTEMPTS, "login attempt rejected");
                }
                Err(error) => {
                    tracing::error!(attempt, max = LOGIN_ATTEMPTS, %error, "login request failed");
                }
            }

            if attempt < LOGIN_ATTEMPTS {
                tokio::time::sleep(LOGIN_RETRY_DELAY).await;
            }
        }

        self.state.send_replace(SessionState::Failed);
        Err(CrawlError::SessionFailed)
    }

    /// React to a detected disconnect.
    ///
    /// The first caller to observe the drop flips `Authenticated` to
    /// `Unauthenticated` and drives the reconnect; every other caller waits
    /// on the state channel for that sequence to resolve. The state is
    /// mutated once per genuine disconnect, never once per caller.
    pub async fn reauthenticate(&self) -> Result<()> {
        let drives_reconnect = self.state.send_if_modified(|state| {
            if *state == SessionState::Authenticated {
                *state = SessionState::Unauthenticated;
                true
            } else {
                false
            }
        });

        if drives_reconnect {
            self.login().await
        } else {
            self.wait_until_authenticated().await
        }
    }

    /// Block until an in-flight login resolves.
    pub async fn wait_until_authenticated(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        let resolved = rx
            .wait_for(|state| {
                matches!(state, SessionState::Authenticated | SessionState::Failed)
            })
            .await
            .map_err(|_| CrawlError::SessionFailed)?;

        match *resolved {
            SessionState::Authenticated => Ok(()),
            _ => Err(CrawlError::SessionFailed),
        }
    }

    /// One authorization round trip: fetch the login page, lift the CSRF
    /// token out of it, POST the credential form. Returns the response
    /// body for verification.
    async fn authorize(&self) -> Result<String> {
        let login_page = self
            .transport
            .get(&format!("{}/login", self.base_url))
            .await
            .map_err(|e| CrawlError::Transport(e.to_string()))?;

        let token = extract::csrf_token(&login_page.body)
            .ok_or_else(|| anyhow::anyhow!("login page carried no csrf token"))?;

        let form = [
            ("authenticity_token", token.as_str()),
            ("email", self.credentials.email.as_str()),
            ("password", self.credentials.password.as_str()),
        ];

        let response = self
            .transport
            .post_form(&format!("{}/session", self.base_url), &form)
            .await
            .map_err(|e| CrawlError::Transport(e.to_string()))?;

        Ok(response.body)
    }

    /// Check whether a post-login response body is an authenticated page.
    ///
    /// The logged-out marker appears within the first few hundred bytes of
    /// every signed-out page, so only a bounded prefix is scanned. When the
    /// marker is present, any user-facing alert text is logged best-effort.
    async fn verify_login(&self, body: String) -> bool {
        let prefix: String = body.chars().take(LOGIN_MARKER_WINDOW).collect();
        if !prefix.contains("logged-out") {
            return true;
        }

        // Signed out; surface the page alert if one exists.
        let alert = tokio::task::spawn_blocking(move || extract::alert_message(&body)).await;
        if let Ok(Some(message)) = alert {
            tracing::error!(alert = %message, "alert message in login response");
        }

        false
    }
}
