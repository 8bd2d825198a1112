//! Run observer.
//!
//! Components report progress and degraded fetches through a [`Reporter`]
//! handed to them for the lifetime of one batch run, instead of writing to
//! global state.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Retrying {
        target: String,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: String,
    },
    GaveUp {
        target: String,
        attempts: u32,
        error: String,
    },
    PageFetched {
        label: String,
        page: usize,
        items: usize,
        collected: usize,
        total_hint: Option<u64>,
    },
    PageCapReached {
        label: String,
        pages: usize,
    },
    Enriched {
        label: String,
        id: String,
        position: usize,
        total: usize,
        ok: bool,
    },
}

pub trait Reporter: Send + Sync {
    fn report(&self, event: &FetchEvent);
}

/// Default reporter: every event becomes a `tracing` record.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &FetchEvent) {
        match event {
            FetchEvent::Retrying {
                target,
                attempt,
                max_attempts,
                delay,
                error,
            } => {
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::warn!(
                    url = %target,
                    attempt,
                    max_attempts,
                    delay_ms,
                    %error,
                    "request failed, retrying after delay"
                );
            }
            FetchEvent::GaveUp {
                target,
                attempts,
                error,
            } => {
                tracing::error!(url = %target, attempts, %error, "giving up on request");
            }
            FetchEvent::PageFetched {
                label,
                page,
                items,
                collected,
                total_hint,
            } => {
                tracing::debug!(
                    %label,
                    page,
                    items,
                    collected,
                    total = ?total_hint,
                    "fetched page"
                );
            }
            FetchEvent::PageCapReached { label, pages } => {
                tracing::warn!(%label, pages, "page cap reached, stopping pagination");
            }
            FetchEvent::Enriched {
                label,
                id,
                position,
                total,
                ok,
            } => {
                if *ok {
                    tracing::debug!(%label, %id, position, total, "enriched");
                } else {
                    tracing::warn!(%label, %id, position, total, "detail fetch returned nothing");
                }
            }
        }
    }
}

/// Keeps every event in memory. Used by tests to assert on run behaviour.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn events(&self) -> Vec<FetchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delays of every retry, in the order they were slept.
    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FetchEvent::Retrying { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: &FetchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
