//! The two fetch jobs: videos and webcasts.
//!
//! Both build a [`VbrickClient`] from the loaded config, pull the entity
//! listing, enrich every entity and write their artifacts. Only an auth
//! failure or a write error aborts a run; everything else degrades and is
//! logged.

use std::sync::Arc;

use chrono::{DateTime, Local, SecondsFormat, TimeDelta, Utc};
use serde_json::{json, Map, Value};
use vbetl_client::{ClientSettings, Reporter, TracingReporter, VbrickClient};
use vbetl_core::{AppConfig, CategoryMap};
use vbetl_report::{
    failed_table, video_rows, video_table, webcast_row, webcast_table, write_json_pretty,
    WebcastMaps,
};

use crate::publish_best_effort;

fn build_client(config: &AppConfig) -> anyhow::Result<VbrickClient> {
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);
    Ok(VbrickClient::new(
        ClientSettings::from_app_config(config),
        reporter,
    )?)
}

fn days(n: i64) -> anyhow::Result<TimeDelta> {
    TimeDelta::try_days(n).ok_or_else(|| anyhow::anyhow!("lookback of {n} days is out of range"))
}

pub(crate) async fn run_videos(config: &AppConfig) -> anyhow::Result<()> {
    let paths = &config.outputs;
    let client = build_client(config)?;

    let since = Utc::now() - days(config.video_lookback_days)?;
    let videos = client.search_active_videos(since).await?;
    tracing::info!(count = videos.len(), "fetched active videos");

    let metadata: Vec<&Map<String, Value>> = videos.iter().map(|v| &v.fields).collect();
    write_json_pretty(&paths.video_metadata_json, &metadata)?;

    let today = Local::now().date_naive();
    let enrichment = client.enrich_videos(videos, today).await?;

    let summary: Map<String, Value> = enrichment
        .enriched
        .iter()
        .map(|e| {
            (
                e.entity.id.clone(),
                json!({ "metadata": e.entity.fields, "dailySummary": e.detail }),
            )
        })
        .collect();
    write_json_pretty(&paths.video_summary_json, &summary)?;

    let device = CategoryMap::video_device();
    let browser = CategoryMap::video_browser();
    let rows = enrichment
        .enriched
        .iter()
        .flat_map(|e| video_rows(&e.entity.fields, &e.detail, &device, &browser))
        .collect();
    let table = video_table(rows);
    table.write_csv(&paths.video_analytics_csv)?;

    publish_best_effort(
        &paths.video_analytics_csv,
        paths.publish_dir.as_deref(),
        "video_analytics.csv",
    );
    tracing::info!(videos = summary.len(), rows = table.len(), "video export complete");
    Ok(())
}

pub(crate) async fn run_webcasts(
    config: &AppConfig,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let paths = &config.outputs;
    let (from, to) = event_range(from, to, config.webcast_lookback_days)?;
    let client = build_client(config)?;

    let after = from.to_rfc3339_opts(SecondsFormat::Secs, true);
    let before = to.to_rfc3339_opts(SecondsFormat::Secs, true);
    let events = client.list_scheduled_events(&after, &before).await?;
    if events.is_empty() {
        tracing::warn!(%after, %before, "no scheduled events in range, nothing to export");
        return Ok(());
    }

    let metadata: Vec<&Map<String, Value>> = events.iter().map(|e| &e.fields).collect();
    write_json_pretty(&paths.webcast_metadata_json, &metadata)?;

    let enrichment = client.enrich_events(events).await?;

    if !enrichment.enriched.is_empty() {
        let maps = WebcastMaps::default();
        let rows = enrichment
            .enriched
            .iter()
            .map(|e| webcast_row(&e.entity.fields, &e.detail, &maps))
            .collect();
        webcast_table(rows).write_csv(&paths.webcast_summary_csv)?;
        publish_best_effort(
            &paths.webcast_summary_csv,
            paths.publish_dir.as_deref(),
            "webcast_summary.csv",
        );
    }

    if !enrichment.failed.is_empty() {
        let failed = failed_table(
            enrichment
                .failed
                .iter()
                .map(|f| (f.id.as_str(), f.title.as_str())),
        );
        failed.write_csv(&paths.failed_webcasts_csv)?;
        tracing::warn!(
            count = enrichment.failed.len(),
            path = %paths.failed_webcasts_csv.display(),
            "some webcasts had no attendance report"
        );
    }

    tracing::info!(
        exported = enrichment.enriched.len(),
        failed = enrichment.failed.len(),
        "webcast export complete"
    );
    Ok(())
}

/// Resolves the event window. `to` defaults to now; `from` to midnight UTC
/// `lookback_days` before `to`.
fn event_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    lookback_days: i64,
) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let to = to.unwrap_or_else(Utc::now);
    let from = match from {
        Some(from) => from,
        None => (to - days(lookback_days)?)
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| anyhow::anyhow!("cannot compute start of event range"))?,
    };
    if from > to {
        anyhow::bail!("event range start {from} is after its end {to}");
    }
    Ok((from, to))
}
