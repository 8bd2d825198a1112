use std::sync::{Arc, Mutex};

use serde_json::json;

use super::*;
use crate::reporter::RecordingReporter;

fn spec(max_pages: usize) -> ScrollSpec {
    ScrollSpec {
        label: "videos".to_owned(),
        items_field: "videos".to_owned(),
        cursor_field: "scrollId".to_owned(),
        cursor_param: "scrollId".to_owned(),
        total_field: Some("totalVideos".to_owned()),
        max_pages,
        page_delay: Duration::ZERO,
    }
}

fn page(items: usize, offset: usize, cursor: Option<&str>) -> Value {
    let videos: Vec<Value> = (0..items).map(|i| json!({"id": format!("v{}", offset + i)})).collect();
    json!({ "videos": videos, "scrollId": cursor, "totalVideos": 5 })
}

// ---------------------------------------------------------------------------
// Termination
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_page_ends_scroll_after_n_plus_one_fetches() {
    let reporter = RecordingReporter::default();
    let pages = vec![page(3, 0, Some("c1")), page(2, 3, Some("c2")), page(0, 5, Some("c3"))];
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);

    let outcome = scroll(&spec(10), &reporter, |cursor| {
        let seen = Arc::clone(&seen_in);
        let pages = pages.clone();
        async move {
            let mut seen = seen.lock().unwrap();
            seen.push(cursor);
            Ok(Some(pages[seen.len() - 1].clone()))
        }
    })
    .await
    .unwrap();

    assert_eq!(outcome.items.len(), 5);
    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.termination, Termination::EmptyPage);
    assert_eq!(outcome.total_hint, Some(5));
    let ids: Vec<&str> = outcome.items.iter().map(|v| v["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["v0", "v1", "v2", "v3", "v4"]);
}

#[tokio::test]
async fn cursor_is_replayed_verbatim() {
    let reporter = RecordingReporter::default();
    let pages = vec![
        page(1, 0, Some("opaque==/+token")),
        page(1, 1, Some("second cursor")),
        page(1, 2, None),
    ];
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);

    let outcome = scroll(&spec(10), &reporter, |cursor| {
        let seen = Arc::clone(&seen_in);
        let pages = pages.clone();
        async move {
            let mut seen = seen.lock().unwrap();
            seen.push(cursor);
            Ok(Some(pages[seen.len() - 1].clone()))
        }
    })
    .await
    .unwrap();

    assert_eq!(outcome.termination, Termination::CursorExhausted);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            None,
            Some("opaque==/+token".to_owned()),
            Some("second cursor".to_owned())
        ]
    );
}

#[tokio::test]
async fn endless_cursor_stops_at_page_cap() {
    let reporter = RecordingReporter::default();
    let outcome = scroll(&spec(4), &reporter, |_| async {
        Ok(Some(page(2, 0, Some("again"))))
    })
    .await
    .unwrap();

    assert_eq!(outcome.pages, 4);
    assert_eq!(outcome.items.len(), 8);
    assert_eq!(outcome.termination, Termination::PageCap);
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, FetchEvent::PageCapReached { pages: 4, .. })));
}

#[tokio::test]
async fn failed_fetch_keeps_collected_items() {
    let reporter = RecordingReporter::default();
    let calls = Arc::new(Mutex::new(0usize));
    let calls_in = Arc::clone(&calls);

    let outcome = scroll(&spec(10), &reporter, |_| {
        let calls = Arc::clone(&calls_in);
        async move {
            let mut n = calls.lock().unwrap();
            *n += 1;
            if *n == 1 {
                Ok(Some(page(2, 0, Some("c1"))))
            } else {
                Ok(None)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(outcome.termination, Termination::FetchFailed);
    assert_eq!(outcome.items.len(), 2);
    assert_eq!(outcome.pages, 2);
}

#[tokio::test]
async fn fatal_errors_propagate() {
    let reporter = RecordingReporter::default();
    let result = scroll(&spec(10), &reporter, |_| async {
        Err(ClientError::Auth(crate::error::AuthError::MissingToken))
    })
    .await;
    assert!(matches!(result, Err(ClientError::Auth(_))));
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn envelope_excludes_items_and_comes_from_last_page() {
    let reporter = RecordingReporter::default();
    let pages = vec![
        json!({"sessions": [{"a": 1}], "scrollId": "s1", "attendeeCount": 1}),
        json!({"sessions": [], "scrollId": "s2", "attendeeCount": 2}),
    ];
    let mut spec = spec(10);
    spec.items_field = "sessions".to_owned();
    spec.total_field = None;
    let idx = Arc::new(Mutex::new(0usize));
    let idx_in = Arc::clone(&idx);

    let outcome = scroll(&spec, &reporter, |_| {
        let idx = Arc::clone(&idx_in);
        let pages = pages.clone();
        async move {
            let mut i = idx.lock().unwrap();
            *i += 1;
            Ok(Some(pages[*i - 1].clone()))
        }
    })
    .await
    .unwrap();

    let envelope = outcome.envelope.unwrap();
    assert!(!envelope.contains_key("sessions"));
    assert_eq!(envelope["attendeeCount"], json!(2));
    assert_eq!(outcome.total_hint, None);
}

#[tokio::test]
async fn non_array_items_are_treated_as_empty() {
    let reporter = RecordingReporter::default();
    let outcome = scroll(&spec(10), &reporter, |_| async {
        Ok(Some(json!({"videos": "oops", "scrollId": "c"})))
    })
    .await
    .unwrap();
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.termination, Termination::EmptyPage);
}
