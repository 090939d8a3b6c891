// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity record types produced by the crawl.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel for equipment fields the detail page did not carry.
pub const UNKNOWN_EQUIPMENT: &str = "-";

/// Feed-level identity of an activity, known before (or without) fetching
/// the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInfo {
    /// Whether the entry carries a route map
    pub routable: bool,
    /// Activity title
    pub title: String,
    /// Detail-page reference, relative to the site root
    pub href: String,
    /// Athlete display name
    pub athlete_name: String,
    /// Activity-type label (Run, Ride, ...)
    pub activity_type: String,
    /// Calendar date of the activity (no time component)
    pub date: NaiveDate,
}

/// Metrics extracted from an activity's detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Distance in kilometers
    pub distance_km: f64,
    /// Moving time in seconds
    pub moving_time_secs: u32,
    /// Average pace in seconds per kilometer
    pub pace_secs_per_km: u32,
    /// Elevation gain in meters (0 when the page omits it)
    pub elevation_gain_m: u32,
    /// Calories burned (0 when the page omits or dashes it)
    pub calories: u32,
    /// Recording device label, "-" when absent
    pub device: String,
    /// Gear label, "-" sentinels when absent
    pub gear: Gear,
}

/// Gear name and recorded mileage, split from the detail page's gear label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gear {
    pub name: String,
    /// Mileage with the enclosing brackets stripped, e.g. "2,441.7 km"
    pub mileage: String,
}

impl Default for Gear {
    fn default() -> Self {
        Self {
            name: UNKNOWN_EQUIPMENT.to_string(),
            mileage: UNKNOWN_EQUIPMENT.to_string(),
        }
    }
}

/// A fully extracted and validated activity record.
///
/// Created by a single extraction task and immutable afterwards; entries
/// that fail extraction are discarded rather than surfaced partially.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub info: ActivityInfo,
    pub metrics: ActivityMetrics,
}
