//! Video search and per-video summary statistics.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use crate::enrich::{enrich_all, Enrichment};
use crate::error::ClientError;
use crate::pagination::{ScrollSpec, Termination};
use crate::types::{entities_from_values, Entity, EntityKind};

use super::{AuthScheme, VbrickClient};

impl VbrickClient {
    /// Lists every active video uploaded since `uploaded_since`.
    ///
    /// Pages through `videos/search` until the listing is exhausted or the
    /// page cap is hit. A failed first page yields an empty list.
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn search_active_videos(
        &self,
        uploaded_since: DateTime<Utc>,
    ) -> Result<Vec<Entity>, ClientError> {
        let spec = ScrollSpec {
            label: EntityKind::Video.label().to_owned(),
            items_field: "videos".to_owned(),
            cursor_field: "scrollId".to_owned(),
            cursor_param: "scrollId".to_owned(),
            total_field: Some("totalVideos".to_owned()),
            max_pages: self.max_pages,
            page_delay: self.inter_request_delay,
        };
        let params = vec![
            ("count".to_owned(), self.page_size.to_string()),
            ("status".to_owned(), "Active".to_owned()),
            (
                "fromUploadDate".to_owned(),
                uploaded_since.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];

        tracing::info!(from = %params[2].1, "searching active videos");
        let outcome = self
            .scroll_endpoint(&spec, &["api", "v2", "videos", "search"], &params, AuthScheme::Bearer)
            .await?;
        if outcome.termination == Termination::FetchFailed && outcome.pages == 1 {
            tracing::error!("initial video search failed, no videos fetched");
        }

        Ok(entities_from_values(EntityKind::Video, outcome.items))
    }

    /// Fetches `summary-statistics` for one video, optionally bounded by
    /// `after`/`before` dates (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn video_summary(
        &self,
        video_id: &str,
        after: Option<&str>,
        before: Option<&str>,
    ) -> Result<Option<Value>, ClientError> {
        let mut params = Vec::new();
        if let Some(after) = after {
            params.push(("after".to_owned(), after.to_owned()));
        }
        if let Some(before) = before {
            params.push(("before".to_owned(), before.to_owned()));
        }
        self.get_json(
            &["api", "v2", "videos", video_id, "summary-statistics"],
            &params,
            AuthScheme::Bearer,
        )
        .await
    }

    /// Attaches summary statistics to every video, from its upload date
    /// through `today`. Videos whose statistics could not be fetched are kept
    /// with an empty detail.
    ///
    /// # Errors
    ///
    /// Only fatal errors ([`ClientError::Auth`]).
    pub async fn enrich_videos(
        &self,
        videos: Vec<Entity>,
        today: NaiveDate,
    ) -> Result<Enrichment, ClientError> {
        let before = today.format("%Y-%m-%d").to_string();
        enrich_all(
            EntityKind::Video.label(),
            videos,
            EntityKind::Video.failure_policy(),
            self.inter_request_delay,
            self.reporter.as_ref(),
            |video| {
                let id = video.id.clone();
                let after = video.date_prefix().map(str::to_owned);
                let before = before.clone();
                async move {
                    self.video_summary(&id, after.as_deref(), Some(&before))
                        .await
                }
            },
        )
        .await
    }
}
