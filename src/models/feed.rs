// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Feed-page types: entry stubs, pagination cursor, date filter.

use crate::models::ActivityInfo;
use chrono::NaiveDate;

/// Optional predicate over an entry's declared date.
///
/// Entries whose feed date does not match are dropped before their detail
/// page is fetched, saving the network round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    pub day: NaiveDate,
}

impl DateFilter {
    pub fn new(day: NaiveDate) -> Self {
        Self { day }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.day == date
    }
}

/// Lightweight summary of one feed entry, parsed from the listing page
/// before its detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStub {
    /// Detail-page reference, relative to the site root
    pub href: String,
    /// Declared calendar date from the feed listing
    pub date: NaiveDate,
    /// Whether the feed entry carried a route map
    pub routable: bool,
    /// Full identity when the feed rendered the entry with an embedded
    /// JSON payload; `None` sends the pipeline through identity resolution
    /// on the detail page.
    pub info: Option<ActivityInfo>,
}

/// A feed block: either one athlete's activity or a group block expanding
/// to several member entries that share a date and route flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStub {
    Single(EntryStub),
    Group(Vec<EntryStub>),
}

/// One parsed page of the activity feed.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub stubs: Vec<FeedStub>,
    /// Pagination key for the next page; `None` on the terminal page.
    /// Derived from the last block of each stream, minimum when both
    /// single and group blocks are present.
    pub cursor: Option<i64>,
}

impl FeedPage {
    /// Flatten the page's blocks into individually dispatchable entries.
    pub fn entries(&self) -> impl Iterator<Item = &EntryStub> {
        self.stubs.iter().flat_map(|stub| match stub {
            FeedStub::Single(entry) => std::slice::from_ref(entry).iter(),
            FeedStub::Group(entries) => entries.iter(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(href: &str) -> EntryStub {
        EntryStub {
            href: href.to_string(),
            date: NaiveDate::from_ymd_opt(2021, 9, 3).unwrap(),
            routable: false,
            info: None,
        }
    }

    #[test]
    fn test_entries_flattens_groups_in_order() {
        let page = FeedPage {
            stubs: vec![
                FeedStub::Single(stub("/activities/1")),
                FeedStub::Group(vec![stub("/activities/2"), stub("/activities/3")]),
                FeedStub::Single(stub("/activities/4")),
            ],
            cursor: Some(1_620_486_309),
        };

        let hrefs: Vec<&str> = page.entries().map(|e| e.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "/activities/1",
                "/activities/2",
                "/activities/3",
                "/activities/4"
            ]
        );
    }

    #[test]
    fn test_date_filter() {
        let filter = DateFilter::new(NaiveDate::from_ymd_opt(2021, 9, 3).unwrap());
        assert!(filter.matches(NaiveDate::from_ymd_opt(2021, 9, 3).unwrap()));
        assert!(!filter.matches(NaiveDate::from_ymd_opt(2021, 9, 4).unwrap()));
    }
}
