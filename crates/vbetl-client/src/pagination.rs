//! Scroll-cursor pagination.
//!
//! Every paged vendor listing answers with an envelope holding an items array
//! and an opaque cursor. [`scroll`] replays the cursor from page N verbatim as
//! the only changing parameter of page N+1 until one of the stop conditions in
//! [`Termination`] is hit.

use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::reporter::{FetchEvent, Reporter};

/// Shape of one paged listing.
#[derive(Debug, Clone)]
pub struct ScrollSpec {
    /// Name used in progress reports.
    pub label: String,
    /// Envelope field holding the page's items.
    pub items_field: String,
    /// Envelope field holding the next cursor.
    pub cursor_field: String,
    /// Query parameter the cursor is sent back in.
    pub cursor_param: String,
    /// Envelope field with the total-count hint, read from the first page only.
    pub total_field: Option<String>,
    pub max_pages: usize,
    /// Pause before every page after the first.
    pub page_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    EmptyPage,
    CursorExhausted,
    FetchFailed,
    PageCap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    /// Items of every page, in page order.
    pub items: Vec<Value>,
    /// Number of fetches issued.
    pub pages: usize,
    pub total_hint: Option<u64>,
    pub termination: Termination,
    /// Last successfully fetched envelope with the items field removed.
    pub envelope: Option<Map<String, Value>>,
}

/// Drives `fetch_page` through a listing.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// cursor afterwards. A fetch that degrades to `None` ends the scroll with
/// [`Termination::FetchFailed`]; whatever was collected is kept.
///
/// # Errors
///
/// Propagates fatal [`ClientError`]s from `fetch_page` unchanged.
pub async fn scroll<F, Fut>(
    spec: &ScrollSpec,
    reporter: &dyn Reporter,
    mut fetch_page: F,
) -> Result<ScrollOutcome, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Option<Value>, ClientError>>,
{
    let mut items: Vec<Value> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    let mut total_hint: Option<u64> = None;
    let mut envelope: Option<Map<String, Value>> = None;

    let termination = loop {
        if pages >= spec.max_pages {
            reporter.report(&FetchEvent::PageCapReached {
                label: spec.label.clone(),
                pages,
            });
            break Termination::PageCap;
        }

        if pages > 0 && !spec.page_delay.is_zero() {
            tokio::time::sleep(spec.page_delay).await;
        }
        pages += 1;

        let Some(page) = fetch_page(cursor.take()).await? else {
            break Termination::FetchFailed;
        };

        let mut page = match page {
            Value::Object(map) => map,
            other => {
                tracing::warn!(label = %spec.label, page = pages, kind = %json_kind(&other), "page is not a JSON object");
                break Termination::EmptyPage;
            }
        };

        if pages == 1 {
            total_hint = spec
                .total_field
                .as_deref()
                .and_then(|field| page.get(field))
                .and_then(Value::as_u64);
        }

        let page_items = match page.remove(&spec.items_field) {
            Some(Value::Array(values)) => values,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::warn!(
                    label = %spec.label,
                    field = %spec.items_field,
                    kind = %json_kind(&other),
                    "items field is not an array, treating page as empty"
                );
                Vec::new()
            }
        };
        let next_cursor = page
            .get(&spec.cursor_field)
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        envelope = Some(page);

        if page_items.is_empty() {
            break Termination::EmptyPage;
        }

        let page_len = page_items.len();
        items.extend(page_items);
        reporter.report(&FetchEvent::PageFetched {
            label: spec.label.clone(),
            page: pages,
            items: page_len,
            collected: items.len(),
            total_hint,
        });

        match next_cursor {
            Some(next) => cursor = Some(next),
            None => break Termination::CursorExhausted,
        }
    };

    tracing::info!(
        label = %spec.label,
        pages,
        items = items.len(),
        termination = ?termination,
        "pagination finished"
    );

    Ok(ScrollOutcome {
        items,
        pages,
        total_hint,
        termination,
        envelope,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
