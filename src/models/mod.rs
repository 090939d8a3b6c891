// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the crawl engine.

pub mod activity;
pub mod feed;

pub use activity::{Activity, ActivityInfo, ActivityMetrics, Gear, UNKNOWN_EQUIPMENT};
pub use feed::{DateFilter, EntryStub, FeedPage, FeedStub};
