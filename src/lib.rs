// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Club-Crawler: authenticated crawl engine for a club activity feed.
//!
//! Logs into the site, walks the cursor-paginated feed, fetches every
//! entry's detail page concurrently and returns validated activity
//! records.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{CrawlError, Discard};
pub use models::{Activity, DateFilter};
pub use services::{Crawler, Credentials};
