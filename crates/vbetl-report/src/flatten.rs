//! Nested per-entity statistics to flat CSV rows.
//!
//! Raw category keys go through a [`CategoryMap`] and counts are summed per
//! canonical label. Videos produce one row per day of views; webcasts one row
//! per event. Label columns only exist for labels actually observed, so the
//! header is computed from the finished rows by [`Table::from_rows`].

use serde_json::{Map, Value};
use vbetl_core::CategoryMap;

use crate::table::{Cell, Row, Table};

/// Fixed leading columns of the video analytics CSV.
pub const VIDEO_COLUMNS: [&str; 13] = [
    "video_id",
    "title",
    "playbackUrl",
    "duration",
    "whenUploaded",
    "lastViewed",
    "whenPublished",
    "commentCount",
    "score",
    "uploadedBy",
    "tags",
    "date",
    "views",
];

/// Fixed leading columns of the webcast summary CSV.
pub const WEBCAST_COLUMNS: [&str; 11] = [
    "id",
    "title",
    "vodId",
    "eventUrl",
    "attendeeCount",
    "attendeeTotal",
    "startDate",
    "endDate",
    "total_viewingTime",
    "category",
    "subcategory",
];

const VIDEO_METADATA_FIELDS: [&str; 9] = [
    "title",
    "playbackUrl",
    "duration",
    "whenUploaded",
    "lastViewed",
    "whenPublished",
    "commentCount",
    "score",
    "uploadedBy",
];

/// Label tables used for one webcast run.
#[derive(Debug, Clone)]
pub struct WebcastMaps {
    pub zone: CategoryMap,
    pub browser: CategoryMap,
    pub device: CategoryMap,
}

impl Default for WebcastMaps {
    fn default() -> Self {
        Self {
            zone: CategoryMap::webcast_zone(),
            browser: CategoryMap::webcast_browser(),
            device: CategoryMap::webcast_device(),
        }
    }
}

/// Sums `{key, value}` entries per canonical label, in first-seen label
/// order. Missing or non-numeric values count as zero.
#[must_use]
pub fn group_counts(entries: Option<&Value>, map: &CategoryMap) -> Vec<(String, Cell)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for entry in entries.and_then(Value::as_array).into_iter().flatten() {
        let label = map.label(entry.get("key").and_then(Value::as_str));
        let value = entry.get("value").and_then(Value::as_f64).unwrap_or_else(|| {
            if entry.get("value").is_some_and(|v| !v.is_null()) {
                tracing::warn!(%entry, "count entry has a non-numeric value, counting as zero");
            }
            0.0
        });
        match totals.iter_mut().find(|(l, _)| l == label) {
            Some((_, total)) => *total += value,
            None => totals.push((label.to_owned(), value)),
        }
    }
    totals
        .into_iter()
        .map(|(label, total)| (label, Cell::from_f64(total)))
        .collect()
}

/// `", "`-joined tags when the field is an array, the raw value otherwise.
fn tags_cell(tags: Option<&Value>) -> Cell {
    match tags {
        Some(Value::Array(items)) => {
            let joined = items
                .iter()
                .map(|t| match t {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            Cell::from(joined.as_str())
        }
        Some(other) => Cell::from_json(other),
        None => Cell::Empty,
    }
}

fn field(map: &Map<String, Value>, key: &str) -> Cell {
    map.get(key).map_or(Cell::Empty, Cell::from_json)
}

/// One row per `totalViewsByDay` entry, each carrying the video's metadata
/// and its grouped device and browser totals. A video without daily views
/// yields no rows.
#[must_use]
pub fn video_rows(
    metadata: &Map<String, Value>,
    summary: &Map<String, Value>,
    device: &CategoryMap,
    browser: &CategoryMap,
) -> Vec<Row> {
    let mut base = Row::new();
    base.insert("video_id".to_owned(), field(metadata, "id"));
    for key in VIDEO_METADATA_FIELDS {
        base.insert(key.to_owned(), field(metadata, key));
    }
    base.insert("tags".to_owned(), tags_cell(metadata.get("tags")));

    let devices = group_counts(summary.get("deviceCounts"), device);
    let browsers = group_counts(summary.get("browserCounts"), browser);

    summary
        .get("totalViewsByDay")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|day| {
            let mut row = base.clone();
            row.insert(
                "date".to_owned(),
                day.get("key").map_or(Cell::Empty, Cell::from_json),
            );
            row.insert(
                "views".to_owned(),
                day.get("value").map_or(Cell::Empty, Cell::from_json),
            );
            for (label, total) in devices.iter().chain(&browsers) {
                row.insert(label.clone(), total.clone());
            }
            row
        })
        .collect()
}

#[must_use]
pub fn video_table(rows: Vec<Row>) -> Table {
    Table::from_rows(&VIDEO_COLUMNS, rows)
}

/// Parses `HH:MM:SS` into seconds; anything else, including a value too
/// large for `i64`, is zero.
#[must_use]
pub fn parse_hms(raw: &str) -> i64 {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return 0;
    };
    match (
        h.trim().parse::<i64>(),
        m.trim().parse::<i64>(),
        s.trim().parse::<i64>(),
    ) {
        (Ok(h), Ok(m), Ok(s)) => {
            let total = h
                .checked_mul(3600)
                .and_then(|secs| m.checked_mul(60).and_then(|m| secs.checked_add(m)))
                .and_then(|secs| secs.checked_add(s));
            total.unwrap_or_else(|| {
                tracing::warn!(value = %raw, "viewing time out of range, counted as zero");
                0
            })
        }
        _ => 0,
    }
}

/// Session attribute as a lookup key; blank and missing become `None`.
fn session_key(session: &Value, key: &str) -> Option<String> {
    match session.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn bump(counter: &mut Vec<(String, i64)>, label: &str) {
    match counter.iter_mut().find(|(l, _)| l == label) {
        Some((_, n)) => *n += 1,
        None => counter.push((label.to_owned(), 1)),
    }
}

/// One summary row for a webcast and its attendance report.
///
/// Every session is counted once under each of browser, device type and
/// zone. `attendeeTotal` is the number of sessions and `total_viewingTime`
/// the sum of their `viewingTime` in seconds.
#[must_use]
pub fn webcast_row(event: &Map<String, Value>, report: &Map<String, Value>, maps: &WebcastMaps) -> Row {
    let sessions: &[Value] = report
        .get("sessions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut browsers: Vec<(String, i64)> = Vec::new();
    let mut devices: Vec<(String, i64)> = Vec::new();
    let mut zones: Vec<(String, i64)> = Vec::new();
    let mut viewing_secs = 0i64;

    for session in sessions {
        bump(
            &mut browsers,
            maps.browser.label(session_key(session, "browser").as_deref()),
        );
        bump(
            &mut devices,
            maps.device.label(session_key(session, "deviceType").as_deref()),
        );
        bump(
            &mut zones,
            maps.zone.label(session_key(session, "zone").as_deref()),
        );
        viewing_secs = viewing_secs.saturating_add(
            session
                .get("viewingTime")
                .and_then(Value::as_str)
                .map_or(0, parse_hms),
        );
    }

    let attendee_total = i64::try_from(sessions.len()).unwrap_or(i64::MAX);

    let mut row = Row::new();
    row.insert("id".to_owned(), field(event, "id"));
    row.insert("title".to_owned(), field(event, "title"));
    row.insert("vodId".to_owned(), field(event, "linkedVideoId"));
    row.insert("eventUrl".to_owned(), field(event, "eventUrl"));
    row.insert("attendeeCount".to_owned(), field(report, "attendeeCount"));
    row.insert("attendeeTotal".to_owned(), Cell::Int(attendee_total));
    row.insert("startDate".to_owned(), field(event, "startDate"));
    row.insert("endDate".to_owned(), field(event, "endDate"));
    row.insert("total_viewingTime".to_owned(), Cell::Int(viewing_secs));
    row.insert("category".to_owned(), field(event, "category"));
    row.insert("subcategory".to_owned(), field(event, "subcategory"));

    for (prefix, counter) in [("browser_", browsers), ("deviceType_", devices), ("zone_", zones)] {
        for (label, n) in counter {
            row.insert(format!("{prefix}{label}"), Cell::Int(n));
        }
    }
    row
}

#[must_use]
pub fn webcast_table(rows: Vec<Row>) -> Table {
    Table::from_rows(&WEBCAST_COLUMNS, rows)
}

/// `id,title` table of events whose attendance could not be fetched.
#[must_use]
pub fn failed_table<'a>(failed: impl IntoIterator<Item = (&'a str, &'a str)>) -> Table {
    let rows = failed
        .into_iter()
        .map(|(id, title)| {
            let mut row = Row::new();
            row.insert("id".to_owned(), Cell::from(id));
            row.insert("title".to_owned(), Cell::from(title));
            row
        })
        .collect();
    Table::from_rows(&["id", "title"], rows)
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
