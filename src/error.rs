// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Crawl error types.
//!
//! Two taxonomies live here:
//! - [`CrawlError`]: session- and page-level failures that abort pagination
//!   or the whole crawl.
//! - [`Discard`]: per-entry outcomes that drop exactly one candidate record
//!   from the result set and are never propagated as crawl failures.

/// Fatal and page-level crawl errors.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Unable to create or update the authenticated session.
    #[error("Unable to create or update session")]
    SessionFailed,

    /// HTTP 429 - too many requests per time unit. Retrying would only
    /// extend the ban, so the crawl surfaces this to the caller instead.
    #[error("HTTP 429 - too many requests per time unit")]
    RateLimited,

    /// HTTP status >= 400 that survived the single blind retry.
    #[error("Server error: HTTP {0}")]
    ServerError(u16),

    /// Request could not be delivered even after reauthentication.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Per-entry discard reasons. Each one excludes a single candidate record
/// from the final collection; the crawl itself continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Discard {
    /// The detail page had no activity title marker - the activity was
    /// deleted and the request was redirected to the dashboard.
    #[error("activity does not exist: {0}")]
    NotFound(String),

    /// The entry's date did not match the active date filter.
    #[error("filtered out by date: {0}")]
    FilteredOut(String),

    /// Degenerate primary metrics - the entry is not a run misfiled as one.
    #[error("non-run activity: {0}")]
    NotARun(String),

    /// A mandatory section could not be parsed.
    #[error("parser error at {0}: {1}")]
    ParseError(String, String),
}

/// Result type alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
