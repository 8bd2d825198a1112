use serde_json::json;

use super::*;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

#[test]
fn single_video_day_flattens_to_one_row() {
    let metadata = object(json!({"id": "v1"}));
    let summary = object(json!({
        "totalViewsByDay": [{"key": "2024-01-01", "value": 10}],
        "deviceCounts": [{"key": "PC", "value": 7}, {"key": "Mobile Device", "value": 3}]
    }));

    let rows = video_rows(
        &metadata,
        &summary,
        &CategoryMap::video_device(),
        &CategoryMap::video_browser(),
    );
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["video_id"], Cell::Text("v1".into()));
    assert_eq!(row["date"], Cell::Text("2024-01-01".into()));
    assert_eq!(row["views"], Cell::Int(10));
    assert_eq!(row["Desktop"], Cell::Int(7));
    assert_eq!(row["Mobile"], Cell::Int(3));

    let table = video_table(rows);
    let mut expected: Vec<&str> = VIDEO_COLUMNS.to_vec();
    expected.extend(["Desktop", "Mobile"]);
    assert_eq!(table.columns(), expected.as_slice());
}

#[test]
fn unmapped_keys_land_in_other_and_sums_are_preserved() {
    let summary = object(json!({
        "totalViewsByDay": [{"key": "2024-01-01", "value": 1}],
        "browserCounts": [
            {"key": "Chrome", "value": 4},
            {"key": "Chrome Mobile", "value": 1},
            {"key": "Firefox", "value": 2},
            {"key": "Safari", "value": 3},
            {"value": 1}
        ]
    }));
    let groups = group_counts(summary.get("browserCounts"), &CategoryMap::video_browser());
    assert_eq!(
        groups,
        vec![
            ("Chrome".to_owned(), Cell::Int(5)),
            ("Other Browser".to_owned(), Cell::Int(6)),
        ]
    );
    let total: f64 = groups.iter().filter_map(|(_, c)| c.as_f64()).sum();
    assert!((total - 11.0).abs() < f64::EPSILON);
}

#[test]
fn one_row_per_day_replicates_totals() {
    let metadata = object(json!({"id": "v2", "title": "Town hall", "tags": ["hr", "q1"]}));
    let summary = object(json!({
        "totalViewsByDay": [
            {"key": "2024-01-01", "value": 4},
            {"key": "2024-01-02", "value": 6}
        ],
        "deviceCounts": [{"key": "PC", "value": 10}]
    }));
    let rows = video_rows(
        &metadata,
        &summary,
        &CategoryMap::video_device(),
        &CategoryMap::video_browser(),
    );
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row["Desktop"], Cell::Int(10));
        assert_eq!(row["tags"], Cell::Text("hr, q1".into()));
        assert_eq!(row["title"], Cell::Text("Town hall".into()));
    }
}

#[test]
fn video_without_daily_views_has_no_rows() {
    let rows = video_rows(
        &object(json!({"id": "v3"})),
        &Map::new(),
        &CategoryMap::video_device(),
        &CategoryMap::video_browser(),
    );
    assert!(rows.is_empty());
}

// ---------------------------------------------------------------------------
// Webcasts
// ---------------------------------------------------------------------------

#[test]
fn parse_hms_accepts_only_three_parts() {
    assert_eq!(parse_hms("01:02:03"), 3723);
    assert_eq!(parse_hms("00:00:00"), 0);
    assert_eq!(parse_hms("12:30"), 0);
    assert_eq!(parse_hms("aa:bb:cc"), 0);
}

#[test]
fn parse_hms_overflow_is_zero() {
    assert_eq!(parse_hms("9999999999999999:00:00"), 0);
    assert_eq!(parse_hms("0:0:9223372036854775807"), i64::MAX);
    assert_eq!(parse_hms("0:1:9223372036854775807"), 0);
}

#[test]
fn oversized_viewing_times_do_not_abort_the_row() {
    let event = object(json!({"id": "e1"}));
    let report = object(json!({
        "sessions": [
            {"viewingTime": "9999999999999999:00:00"},
            {"viewingTime": "00:01:00"}
        ]
    }));
    let row = webcast_row(&event, &report, &WebcastMaps::default());
    assert_eq!(row["total_viewingTime"], Cell::Int(60));
    assert_eq!(row["attendeeTotal"], Cell::Int(2));
}

#[test]
fn webcast_row_counts_sessions_per_dimension() {
    let event = object(json!({
        "id": "e1",
        "title": "All hands",
        "linkedVideoId": "v9",
        "startDate": "2024-03-01T09:00:00Z",
        "category": "Corporate"
    }));
    let report = object(json!({
        "attendeeCount": 4,
        "sessions": [
            {"browser": "Chrome", "deviceType": "PC", "zone": "EMEA CS", "viewingTime": "00:10:00"},
            {"browser": "Microsoft Edge", "deviceType": "Mobile Device", "zone": "APAC", "viewingTime": "00:05:30"},
            {"browser": "Firefox", "deviceType": null, "zone": "Z - Fallback", "viewingTime": "bogus"},
            {"browser": " Chrome ", "zone": "Swiss"}
        ]
    }));

    let row = webcast_row(&event, &report, &WebcastMaps::default());
    assert_eq!(row["vodId"], Cell::Text("v9".into()));
    assert_eq!(row["attendeeCount"], Cell::Int(4));
    assert_eq!(row["attendeeTotal"], Cell::Int(4));
    assert_eq!(row["total_viewingTime"], Cell::Int(930));
    assert_eq!(row["browser_Chrome"], Cell::Int(2));
    assert_eq!(row["browser_Edge"], Cell::Int(1));
    assert_eq!(row["browser_Other"], Cell::Int(1));
    assert_eq!(row["deviceType_PC"], Cell::Int(1));
    assert_eq!(row["deviceType_Mobile"], Cell::Int(1));
    assert_eq!(row["deviceType_Other"], Cell::Int(2));
    assert_eq!(row["zone_EMEA"], Cell::Int(1));
    assert_eq!(row["zone_APAC"], Cell::Int(1));
    assert_eq!(row["zone_Other"], Cell::Int(1));
    assert_eq!(row["zone_Swiss"], Cell::Int(1));
    assert_eq!(row["category"], Cell::Text("Corporate".into()));
    assert_eq!(row["subcategory"], Cell::Empty);
}

#[test]
fn webcast_without_sessions_has_zero_totals() {
    let row = webcast_row(
        &object(json!({"id": "e2"})),
        &object(json!({"sessions": []})),
        &WebcastMaps::default(),
    );
    assert_eq!(row["attendeeTotal"], Cell::Int(0));
    assert_eq!(row["total_viewingTime"], Cell::Int(0));
    assert!(!row.keys().any(|k| k.starts_with("zone_")));
}

#[test]
fn webcast_header_is_union_of_observed_labels() {
    let maps = WebcastMaps::default();
    let a = webcast_row(
        &object(json!({"id": "a"})),
        &object(json!({"sessions": [{"zone": "EMEA"}]})),
        &maps,
    );
    let b = webcast_row(
        &object(json!({"id": "b"})),
        &object(json!({"sessions": [{"zone": "APAC"}]})),
        &maps,
    );
    let table = webcast_table(vec![a, b]);
    let extras: Vec<&str> = table.columns()[WEBCAST_COLUMNS.len()..]
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(
        extras,
        ["browser_Other", "deviceType_Other", "zone_APAC", "zone_EMEA"]
    );
    assert_eq!(table.cell(0, "zone_APAC"), &Cell::Empty);
}

#[test]
fn failed_table_has_id_and_title() {
    let table = failed_table([("e1", "Broken"), ("e2", "")]);
    assert_eq!(table.columns(), ["id", "title"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(1, "title"), &Cell::Empty);
}
