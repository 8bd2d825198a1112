//! Scheduled-event listing and post-event attendance reports.

use serde_json::Value;

use crate::enrich::{enrich_all, Enrichment};
use crate::error::ClientError;
use crate::pagination::{ScrollSpec, Termination};
use crate::types::{entities_from_values, Entity, EntityKind};

use super::{AuthScheme, VbrickClient};

impl VbrickClient {
    /// Lists scheduled events starting between `after` and `before`, oldest
    /// first. The endpoint answers with a bare array; anything else, or a
    /// failed fetch, yields an empty list.
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn list_scheduled_events(
        &self,
        after: &str,
        before: &str,
    ) -> Result<Vec<Entity>, ClientError> {
        let params = vec![
            ("after".to_owned(), after.to_owned()),
            ("before".to_owned(), before.to_owned()),
            ("sortField".to_owned(), "startDate".to_owned()),
            ("sortDirection".to_owned(), "asc".to_owned()),
        ];
        let body = self
            .get_json(&["api", "v2", "scheduled-events"], &params, AuthScheme::Bearer)
            .await?;

        let events = match body {
            Some(Value::Array(items)) => items,
            Some(_) => {
                tracing::warn!("scheduled-events response is not an array");
                Vec::new()
            }
            None => Vec::new(),
        };
        tracing::info!(count = events.len(), %after, %before, "listed scheduled events");
        Ok(entities_from_values(EntityKind::ScheduledEvent, events))
    }

    /// Collects the full post-event report for one event.
    ///
    /// All `sessions` pages are concatenated into the last page's envelope.
    /// Returns `None` if any page could not be fetched; hitting the page cap
    /// still returns what was collected.
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn attendance_report(&self, event_id: &str) -> Result<Option<Value>, ClientError> {
        let spec = ScrollSpec {
            label: format!("attendance:{event_id}"),
            items_field: "sessions".to_owned(),
            cursor_field: "scrollId".to_owned(),
            cursor_param: "scrollId".to_owned(),
            total_field: None,
            max_pages: self.attendance_max_pages,
            page_delay: self.inter_request_delay,
        };
        let outcome = self
            .scroll_endpoint(
                &spec,
                &["api", "v2", "scheduled-events", event_id, "post-event-report"],
                &[],
                AuthScheme::Vbrick,
            )
            .await?;

        if outcome.termination == Termination::FetchFailed {
            tracing::warn!(%event_id, pages = outcome.pages, "attendance report incomplete");
            return Ok(None);
        }

        let mut report = outcome.envelope.unwrap_or_default();
        report.insert("sessions".to_owned(), Value::Array(outcome.items));
        Ok(Some(Value::Object(report)))
    }

    /// Attaches the attendance report to every event. Events whose report
    /// could not be fetched are listed in [`Enrichment::failed`].
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn enrich_events(&self, events: Vec<Entity>) -> Result<Enrichment, ClientError> {
        enrich_all(
            EntityKind::ScheduledEvent.label(),
            events,
            EntityKind::ScheduledEvent.failure_policy(),
            self.inter_request_delay,
            self.reporter.as_ref(),
            |event| {
                let id = event.id.clone();
                async move { self.attendance_report(&id).await }
            },
        )
        .await
    }
}
