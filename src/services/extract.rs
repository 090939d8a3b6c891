// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pure page-extraction functions.
//!
//! Everything here is synchronous and side-effect free: a page body goes
//! in, typed values or a [`Discard`] come out. Callers run the heavier
//! functions under `tokio::task::spawn_blocking` so tree construction never
//! stalls network I/O, and no parse state crosses an await point.
//!
//! The CSS selectors and JSON key names are site-specific glue; the stage
//! ordering and discard semantics are the contract.

use crate::error::Discard;
use crate::models::{
    Activity, ActivityInfo, ActivityMetrics, DateFilter, EntryStub, FeedPage, FeedStub, Gear,
    UNKNOWN_EQUIPMENT,
};
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

/// Build a selector from a static pattern. The patterns are compile-time
/// constants, so a parse failure is a programming bug.
fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

// ─── Session pages ───────────────────────────────────────────────────────

/// Lift the CSRF meta token out of the login page.
pub fn csrf_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&sel(r#"meta[name="csrf-token"]"#))
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string)
}

/// Best-effort read of the user-facing alert box on a signed-out page.
pub fn alert_message(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&sel("div.alert-message"))
        .next()
        .map(|el| text_of(el).trim().to_string())
        .filter(|msg| !msg.is_empty())
}

/// Display name from a profile page's `<title>`, after the "| " separator.
/// Empty string when the page carries no usable title.
pub fn profile_display_name(html: &str) -> String {
    let doc = Html::parse_document(html);
    let Some(title) = doc.select(&sel("title")).next() else {
        return String::new();
    };

    let text = text_of(title);
    match text.find("| ") {
        Some(idx) => text[idx + 2..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

// ─── Feed page ───────────────────────────────────────────────────────────

/// Embedded JSON payload carried by React-rendered feed entries.
#[derive(Deserialize)]
struct EntryProps {
    activity: EntryActivity,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryActivity {
    id: u64,
    activity_name: String,
    #[serde(rename = "type")]
    activity_type: String,
    start_date: String,
    athlete: EntryAthlete,
    #[serde(default)]
    map_and_photos: Option<EntryMap>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryAthlete {
    athlete_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryMap {
    #[serde(default)]
    activity_map: Option<serde_json::Value>,
}

/// Scan one feed page into entry stubs plus the next-page cursor.
///
/// Zero stubs means the last page was reached and the cursor is `None`.
/// Otherwise the cursor is the `data-updated-at` of the last single block
/// and the last group block, minimum of the two when both streams are
/// present, so no entry can fall between overlapping pages.
pub fn feed_page(html: &str) -> FeedPage {
    let doc = Html::parse_document(html);

    let single_sel = sel("div.activity.entity-details.feed-entry");
    let group_sel = sel("div.feed-entry.group-activity");

    let singles: Vec<ElementRef> = doc.select(&single_sel).collect();
    let groups: Vec<ElementRef> = doc.select(&group_sel).collect();

    if singles.is_empty() && groups.is_empty() {
        return FeedPage::default();
    }

    let mut stubs = Vec::new();
    for block in &singles {
        match single_stub(*block) {
            Some(entry) => stubs.push(FeedStub::Single(entry)),
            None => tracing::warn!("skipping malformed single feed block"),
        }
    }
    for block in &groups {
        match group_stub(*block) {
            Some(entries) if !entries.is_empty() => stubs.push(FeedStub::Group(entries)),
            _ => tracing::warn!("skipping malformed group feed block"),
        }
    }

    let single_cursor = singles.last().and_then(|b| updated_at(*b));
    let group_cursor = groups.last().and_then(|b| updated_at(*b));

    let cursor = match (single_cursor, group_cursor) {
        (Some(s), Some(g)) => Some(s.min(g)),
        (Some(s), None) => Some(s),
        (None, Some(g)) => Some(g),
        (None, None) => None,
    };

    FeedPage { stubs, cursor }
}

fn updated_at(block: ElementRef<'_>) -> Option<i64> {
    block.value().attr("data-updated-at")?.parse().ok()
}

/// One single-athlete feed block, either React-rendered (full identity from
/// the embedded JSON) or legacy markup (identity resolved later from the
/// detail page).
fn single_stub(block: ElementRef<'_>) -> Option<EntryStub> {
    if let Some(raw) = block.value().attr("data-react-props") {
        return json_stub(raw);
    }

    let date = block
        .select(&sel("div.entry-head time.timestamp"))
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(parse_feed_timestamp)?;

    let routable = block.select(&sel("a.entry-image.activity-map")).next().is_some();

    let href = block
        .select(&sel("h3.entry-title.activity-title strong a"))
        .next()
        .and_then(|a| a.value().attr("href"))?
        .to_string();

    Some(EntryStub {
        href,
        date,
        routable,
        info: None,
    })
}

fn json_stub(raw: &str) -> Option<EntryStub> {
    let props: EntryProps = match serde_json::from_str(raw) {
        Ok(props) => props,
        Err(error) => {
            tracing::warn!(%error, "undecodable feed entry payload");
            return None;
        }
    };

    let activity = props.activity;
    let date = parse_json_date(&activity.start_date)?;
    let routable = activity
        .map_and_photos
        .as_ref()
        .is_some_and(|m| m.activity_map.is_some());
    let href = format!("/activities/{}", activity.id);

    Some(EntryStub {
        href: href.clone(),
        date,
        routable,
        info: Some(ActivityInfo {
            routable,
            title: activity.activity_name,
            href,
            athlete_name: activity.athlete.athlete_name,
            activity_type: activity.activity_type,
            date,
        }),
    })
}

/// A group block expands to one stub per member entry; date and route flag
/// are shared across the group.
fn group_stub(block: ElementRef<'_>) -> Option<Vec<EntryStub>> {
    let date = block
        .select(&sel("time.timestamp"))
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(parse_feed_timestamp)?;

    let routable = block.select(&sel("div.group-map")).next().is_some();

    let mut entries = Vec::new();
    for member in block.select(&sel("li.feed-entry.entity-details")) {
        let Some(href) = member
            .select(&sel("a.minimal"))
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            tracing::warn!("group member without detail reference");
            continue;
        };

        entries.push(EntryStub {
            href: href.to_string(),
            date,
            routable,
            info: None,
        });
    }

    Some(entries)
}

/// Feed timestamps come as `0000-00-00 00:00:00 UTC`; only the calendar
/// date is kept.
fn parse_feed_timestamp(raw: &str) -> Option<NaiveDate> {
    chrono::NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S UTC")
        .ok()
        .map(|dt| dt.date())
}

fn parse_json_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    parse_feed_timestamp(raw)
}

// ─── Detail page (extraction pipeline stages) ────────────────────────────

/// Run the ordered extraction stages over a detail page.
///
/// 1. Existence check - a deleted activity redirects to the dashboard,
///    which has no title marker.
/// 2. Identity resolution, only when the stub did not already carry it;
///    re-checks the date filter against the freshly parsed date.
/// 3. Primary metrics (mandatory).
/// 4. Secondary metrics (optional block, zero defaults).
/// 5. Equipment metadata (optional block, "-" defaults).
pub fn detail_page(
    html: &str,
    stub: &EntryStub,
    filter: Option<&DateFilter>,
) -> Result<Activity, Discard> {
    let doc = Html::parse_document(html);
    let href = stub.href.as_str();

    if doc.select(&sel("span.title")).next().is_none() {
        return Err(Discard::NotFound(href.to_string()));
    }

    let info = match &stub.info {
        Some(info) => info.clone(),
        None => {
            let info = identity(&doc, stub)?;
            if let Some(filter) = filter {
                if !filter.matches(info.date) {
                    return Err(Discard::FilteredOut(href.to_string()));
                }
            }
            info
        }
    };

    let (distance_km, moving_time_secs, pace_secs_per_km) = inline_stats(&doc, href)?;
    let (elevation_gain_m, calories) = more_stats(&doc, href)?;
    let (device, gear) = device_section(&doc);

    Ok(Activity {
        info,
        metrics: ActivityMetrics {
            distance_km,
            moving_time_secs,
            pace_secs_per_km,
            elevation_gain_m,
            calories,
            device,
            gear,
        },
    })
}

/// Stage 2: athlete name, activity type, title and date from the detail
/// page header.
fn identity(doc: &Html, stub: &EntryStub) -> Result<ActivityInfo, Discard> {
    let href = stub.href.as_str();
    let parse_err = |what: &str| Discard::ParseError(href.to_string(), what.to_string());

    let header = doc
        .select(&sel("span.title"))
        .next()
        .ok_or_else(|| parse_err("missing title header"))?;

    let athlete_name = header
        .select(&sel("a"))
        .next()
        .map(|a| text_of(a).trim().to_string())
        .ok_or_else(|| parse_err("missing athlete link"))?;

    // Type is the nested span when present, otherwise the text after the
    // dash in "Athlete – Run".
    let activity_type = match header.select(&sel("span")).next() {
        Some(span) => text_of(span).trim().to_string(),
        None => {
            let full = text_of(header);
            full.rsplit('–')
                .next()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| parse_err("missing activity type"))?
        }
    };

    let title = doc
        .select(&sel("h1.activity-name"))
        .next()
        .map(|h| text_of(h).trim().to_string())
        .ok_or_else(|| parse_err("missing activity name"))?;

    let date = doc
        .select(&sel("div.details time"))
        .next()
        .and_then(|t| t.value().attr("datetime").map(str::to_string))
        .and_then(|raw| parse_json_date(&raw))
        .ok_or_else(|| parse_err("missing activity date"))?;

    Ok(ActivityInfo {
        routable: stub.routable,
        title,
        href: href.to_string(),
        athlete_name,
        activity_type,
        date,
    })
}

/// Stage 3: distance, moving time and pace from the inline-stats block.
/// This section is mandatory; degenerate all-zero values mean the entry is
/// not a run.
fn inline_stats(doc: &Html, href: &str) -> Result<(f64, u32, u32), Discard> {
    let parse_err = |what: String| Discard::ParseError(href.to_string(), what);

    let section = doc
        .select(&sel("ul.inline-stats.section"))
        .next()
        .ok_or_else(|| parse_err("missing inline-stats section".to_string()))?;

    let mut distance_km = 0.0_f64;
    let mut moving_time_secs = 0_u32;
    let mut pace_secs_per_km = 0_u32;

    for item in section.select(&sel("li")) {
        let label = match item.select(&sel("div.label")).next() {
            Some(label) => text_of(label).trim().to_string(),
            None => continue,
        };
        let value = item
            .select(&sel("strong"))
            .next()
            .map(|v| text_of(v).trim().to_string())
            .ok_or_else(|| parse_err(format!("no value for '{label}'")))?;

        match label.as_str() {
            "Distance" => {
                distance_km = parse_distance(&value)
                    .ok_or_else(|| parse_err(format!("bad distance '{value}'")))?;
            }
            "Moving Time" | "Elapsed Time" => {
                moving_time_secs = parse_clock(&value)
                    .ok_or_else(|| parse_err(format!("bad moving time '{value}'")))?;
            }
            "Pace" => {
                pace_secs_per_km = parse_pace(&value)
                    .ok_or_else(|| parse_err(format!("bad pace '{value}'")))?;
            }
            _ => {}
        }
    }

    // A run cannot exist without any one of these.
    if distance_km == 0.0 || moving_time_secs == 0 || pace_secs_per_km == 0 {
        return Err(Discard::NotARun(href.to_string()));
    }

    Ok((distance_km, moving_time_secs, pace_secs_per_km))
}

/// "6.25 km" -> 6.25
fn parse_distance(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse().ok()
}

/// "1:18:53" -> 4733, "18:53" -> 1133
fn parse_clock(raw: &str) -> Option<u32> {
    let parts: Vec<u32> = raw
        .split(':')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<u32>>>()?;

    match parts.as_slice() {
        [h, m, s] => Some(h * 3600 + m * 60 + s),
        [m, s] => Some(m * 60 + s),
        _ => None,
    }
}

/// "4:25/km" -> 265, "55s/km" -> 55
fn parse_pace(raw: &str) -> Option<u32> {
    let nums: Vec<u32> = raw
        .split(':')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect();

    match nums.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] => Some(mins * 60 + secs),
        _ => None,
    }
}

/// Stage 4: elevation gain and calories from the optional more-stats
/// block. Absence of the block, or of either row, is not an error.
fn more_stats(doc: &Html, href: &str) -> Result<(u32, u32), Discard> {
    let mut elevation_gain_m = 0_u32;
    let mut calories = 0_u32;

    let Some(section) = doc.select(&sel("div.section.more-stats")).next() else {
        return Ok((elevation_gain_m, calories));
    };

    for row in section.select(&sel("div.row")) {
        let values: Vec<ElementRef> = row.select(&sel("div.spans3")).collect();
        let labels: Vec<ElementRef> = row.select(&sel("div.spans5")).collect();

        for (index, label) in labels.iter().enumerate() {
            let Some(value) = values.get(index) else {
                continue;
            };
            let value_text = text_of(*value);

            match text_of(*label).trim() {
                "Elevation" => {
                    // Value arrives as "129m" with stray whitespace.
                    if let Some(meters) = first_digit_run(&value_text) {
                        elevation_gain_m = meters;
                    }
                }
                "Calories" => {
                    // Seen as "—" (none), "684", or "1,099".
                    let trimmed = value_text.trim();
                    if trimmed != "—" {
                        calories = trimmed.replace(',', "").parse().map_err(|_| {
                            Discard::ParseError(
                                href.to_string(),
                                format!("bad calories '{trimmed}'"),
                            )
                        })?;
                    }
                }
                _ => {}
            }
        }
    }

    Ok((elevation_gain_m, calories))
}

fn first_digit_run(raw: &str) -> Option<u32> {
    let run: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    run.parse().ok()
}

/// Stage 5: device and gear labels from the optional device block.
fn device_section(doc: &Html) -> (String, Gear) {
    let mut device = UNKNOWN_EQUIPMENT.to_string();
    let mut gear = Gear::default();

    let Some(section) = doc.select(&sel("div.section.device-section")).next() else {
        return (device, gear);
    };

    if let Some(gear_el) = section.select(&sel("span.gear-name")).next() {
        // Raw label looks like "adidas Pulseboost HD\n(2,441.7 km)".
        let raw = text_of(gear_el).trim().to_string();
        let parts: Vec<&str> = raw.split('\n').map(str::trim).collect();

        if let Some(name) = parts.first().filter(|n| !n.is_empty()) {
            gear.name = name.to_string();
        }
        if parts.len() == 2 && parts[1].chars().count() > 2 {
            // Strip the brackets around the mileage.
            let inner = parts[1].chars().count() - 2;
            gear.mileage = parts[1].chars().skip(1).take(inner).collect();
        }
    }

    if let Some(device_el) = section.select(&sel("div.device")).next() {
        let label = text_of(device_el).trim().to_string();
        if !label.is_empty() {
            device = label;
        }
    }

    (device, gear)
}
