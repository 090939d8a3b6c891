// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The crawl engine's outbound surface.
//!
//! Workflow for a club crawl:
//! 1. Fetch feed pages strictly in sequence, each page yielding the cursor
//!    for the next one
//! 2. Scan every page into entry stubs, drop stubs failing the date filter
//!    before any detail fetch
//! 3. Spawn one extraction task per entry; the walker never waits on them
//! 4. After the last page (or an abort), join every dispatched task once
//!    and collect the surviving records

use crate::config::Config;
use crate::error::{CrawlError, Result};
use crate::models::{Activity, DateFilter, EntryStub, FeedPage};
use crate::services::extract;
use crate::services::fetch::PageFetcher;
use crate::services::session::{Credentials, Session, SessionState};
use crate::services::transport::{HttpTransport, ReqwestTransport};
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Authenticated crawl engine for one site's club activity feed.
pub struct Crawler {
    session: Arc<Session>,
    fetcher: PageFetcher,
}

impl Crawler {
    /// Log in over the given transport and return a ready engine.
    pub async fn login(
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let session = Arc::new(Session::new(transport, credentials, base_url));
        session.login().await?;

        let fetcher = PageFetcher::new(Arc::clone(&session));
        Ok(Self { session, fetcher })
    }

    /// Log in over a fresh cookie-jar HTTP client configured from `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(
            ReqwestTransport::new().map_err(|e| CrawlError::Transport(e.to_string()))?,
        );
        let credentials = Credentials {
            email: config.email.clone(),
            password: config.password.clone(),
        };
        Self::login(transport, credentials, config.base_url.clone()).await
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Crawl a club's recent-activity feed into validated records.
    ///
    /// Entries that fail extraction are discarded and absent from the
    /// result. A page-fetch server error aborts pagination but the partial
    /// collection is still returned; `RateLimited` and `SessionFailed` are
    /// fatal and propagate after in-flight tasks drain.
    pub async fn club_activities(
        &self,
        club_id: u64,
        filter: Option<DateFilter>,
    ) -> Result<Vec<Activity>> {
        let root = format!(
            "{}/clubs/{}/feed?feed_type=club",
            self.session.base_url(),
            club_id
        );

        let mut handles: Vec<JoinHandle<Result<Option<Activity>>>> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut dispatched = 0_usize;
        let mut page_url = root.clone();
        let mut fatal: Option<CrawlError> = None;

        loop {
            let page = match self.feed_page(&page_url).await {
                Ok(page) => page,
                Err(CrawlError::ServerError(status)) => {
                    tracing::warn!(status, "feed page fetch failed, aborting pagination");
                    break;
                }
                Err(CrawlError::Transport(cause)) => {
                    tracing::warn!(%cause, "feed page unreachable, aborting pagination");
                    break;
                }
                Err(error) => {
                    fatal = Some(error);
                    break;
                }
            };

            if page.is_empty() {
                // Last page reached.
                break;
            }

            for entry in page.entries() {
                // Overlapping pages may repeat an entry; one task per href.
                if !seen.insert(entry.href.clone()) {
                    tracing::debug!(href = %entry.href, "duplicate entry across pages");
                    continue;
                }

                if let Some(filter) = &filter {
                    if !filter.matches(entry.date) {
                        tracing::debug!(href = %entry.href, date = %entry.date, "filtered out");
                        continue;
                    }
                }

                dispatched += 1;
                handles.push(tokio::spawn(process_entry(
                    self.fetcher.clone(),
                    self.session.base_url().to_string(),
                    entry.clone(),
                    filter,
                )));
            }

            match page.cursor {
                Some(before) => {
                    page_url = format!("{root}&before={before}&cursor={before}.0");
                }
                None => {
                    tracing::warn!("page carried entries but no cursor, stopping");
                    break;
                }
            }
        }

        // Join everything dispatched so far exactly once; an abort or a
        // fatal error never discards in-flight work silently.
        let outcomes = join_all(handles).await;

        if let Some(error) = fatal {
            return Err(error);
        }

        let mut activities = Vec::with_capacity(outcomes.len());
        let mut discarded = 0_usize;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(Some(activity))) => activities.push(activity),
                Ok(Ok(None)) => discarded += 1,
                Ok(Err(error)) => return Err(error),
                Err(join_error) => {
                    tracing::error!(%join_error, "extraction task panicked");
                    discarded += 1;
                }
            }
        }

        tracing::info!(
            dispatched,
            collected = activities.len(),
            discarded,
            "club crawl finished"
        );
        Ok(activities)
    }

    /// Display name from an athlete profile page; empty string when the
    /// page does not resolve.
    pub async fn lookup_display_name(&self, profile_uri: &str) -> Result<String> {
        let body = match self.fetcher.fetch(profile_uri).await {
            Ok(body) => body,
            Err(CrawlError::ServerError(status)) => {
                tracing::info!(profile_uri, status, "profile page fetch failed");
                return Ok(String::new());
            }
            Err(error) => return Err(error),
        };

        tokio::task::spawn_blocking(move || extract::profile_display_name(&body))
            .await
            .map_err(|e| CrawlError::Internal(anyhow::anyhow!("profile parse task failed: {e}")))
    }

    /// Fetch one feed page and scan it off the async threads.
    async fn feed_page(&self, uri: &str) -> Result<FeedPage> {
        let body = self.fetcher.fetch(uri).await?;
        tokio::task::spawn_blocking(move || extract::feed_page(&body))
            .await
            .map_err(|e| CrawlError::Internal(anyhow::anyhow!("feed parse task failed: {e}")))
    }
}

/// One extraction task: fetch the detail page and run the pipeline stages.
///
/// Per-entry failures (missing page, unparseable or degenerate metrics,
/// filter mismatch) resolve to `Ok(None)`; only rate limiting and session
/// loss escalate to the crawl level.
async fn process_entry(
    fetcher: PageFetcher,
    base_url: String,
    stub: EntryStub,
    filter: Option<DateFilter>,
) -> Result<Option<Activity>> {
    let detail_url = format!("{}{}", base_url, stub.href);

    let body = match fetcher.fetch(&detail_url).await {
        Ok(body) => body,
        Err(CrawlError::ServerError(status)) => {
            tracing::info!(href = %stub.href, status, "detail fetch failed, discarding entry");
            return Ok(None);
        }
        Err(CrawlError::Transport(cause)) => {
            tracing::info!(href = %stub.href, %cause, "detail unreachable, discarding entry");
            return Ok(None);
        }
        Err(error) => return Err(error),
    };

    let parsed =
        tokio::task::spawn_blocking(move || extract::detail_page(&body, &stub, filter.as_ref()))
            .await
            .map_err(|e| CrawlError::Internal(anyhow::anyhow!("detail parse task failed: {e}")))?;

    match parsed {
        Ok(activity) => Ok(Some(activity)),
        Err(discard) => {
            tracing::info!(%discard, "entry discarded");
            Ok(None)
        }
    }
}
