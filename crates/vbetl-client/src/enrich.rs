//! Per-entity detail fetches.
//!
//! [`enrich_all`] issues exactly one detail fetch per entity, sequentially,
//! with a fixed pause between calls. What happens to an entity whose fetch
//! came back empty depends on its [`FailurePolicy`].

use std::future::Future;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::reporter::{FetchEvent, Reporter};
use crate::types::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep the entity with an empty detail object.
    KeepEmpty,
    /// Exclude the entity from the main output and list it as failed.
    RouteToFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEntity {
    pub entity: Entity,
    pub detail: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntity {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub enriched: Vec<EnrichedEntity>,
    pub failed: Vec<FailedEntity>,
}

/// Runs `fetch` once for every entity and joins the result onto it.
///
/// A detail that is present but not a JSON object is treated like a failed
/// fetch.
///
/// # Errors
///
/// Propagates fatal [`ClientError`]s from `fetch`; the run stops there.
pub async fn enrich_all<F, Fut>(
    label: &str,
    entities: Vec<Entity>,
    policy: FailurePolicy,
    delay: Duration,
    reporter: &dyn Reporter,
    mut fetch: F,
) -> Result<Enrichment, ClientError>
where
    F: FnMut(&Entity) -> Fut,
    Fut: Future<Output = Result<Option<Value>, ClientError>>,
{
    let total = entities.len();
    let mut out = Enrichment::default();

    for (index, entity) in entities.into_iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let detail = match fetch(&entity).await? {
            Some(Value::Object(map)) => Some(map),
            Some(_) | None => None,
        };

        reporter.report(&FetchEvent::Enriched {
            label: label.to_owned(),
            id: entity.id.clone(),
            position: index + 1,
            total,
            ok: detail.is_some(),
        });

        match (detail, policy) {
            (Some(detail), _) => out.enriched.push(EnrichedEntity { entity, detail }),
            (None, FailurePolicy::KeepEmpty) => out.enriched.push(EnrichedEntity {
                entity,
                detail: Map::new(),
            }),
            (None, FailurePolicy::RouteToFailed) => out.failed.push(FailedEntity {
                title: entity.title().to_owned(),
                id: entity.id,
            }),
        }
    }

    tracing::info!(
        %label,
        enriched = out.enriched.len(),
        failed = out.failed.len(),
        "enrichment finished"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::reporter::RecordingReporter;
    use crate::types::{entities_from_values, EntityKind};

    fn entities(kind: EntityKind) -> Vec<Entity> {
        entities_from_values(
            kind,
            vec![
                json!({"id": "a", "title": "Alpha"}),
                json!({"id": "b", "title": "Beta"}),
                json!({"id": "c", "title": "Gamma"}),
            ],
        )
    }

    #[tokio::test]
    async fn keep_empty_retains_every_entity() {
        let reporter = RecordingReporter::default();
        let out = enrich_all(
            "videos",
            entities(EntityKind::Video),
            FailurePolicy::KeepEmpty,
            Duration::ZERO,
            &reporter,
            |e| {
                let failing = e.id == "b";
                async move {
                    if failing {
                        Ok(None)
                    } else {
                        Ok(Some(json!({"views": 1})))
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(out.enriched.len(), 3);
        assert!(out.failed.is_empty());
        assert!(out.enriched[1].detail.is_empty());
        assert_eq!(out.enriched[0].detail["views"], json!(1));
    }

    #[tokio::test]
    async fn route_to_failed_excludes_entity() {
        let reporter = RecordingReporter::default();
        let out = enrich_all(
            "scheduled-events",
            entities(EntityKind::ScheduledEvent),
            FailurePolicy::RouteToFailed,
            Duration::ZERO,
            &reporter,
            |e| {
                let failing = e.id == "b";
                async move {
                    if failing {
                        Ok(None)
                    } else {
                        Ok(Some(json!({"sessions": []})))
                    }
                }
            },
        )
        .await
        .unwrap();

        let ids: Vec<&str> = out.enriched.iter().map(|e| e.entity.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(
            out.failed,
            vec![FailedEntity {
                id: "b".into(),
                title: "Beta".into()
            }]
        );
    }

    #[tokio::test]
    async fn one_fetch_per_entity() {
        let reporter = RecordingReporter::default();
        let calls = AtomicUsize::new(0);
        enrich_all(
            "videos",
            entities(EntityKind::Video),
            FailurePolicy::KeepEmpty,
            Duration::ZERO,
            &reporter,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(None) }
            },
        )
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(reporter.events().len(), 3);
    }

    #[tokio::test]
    async fn non_object_detail_counts_as_failure() {
        let reporter = RecordingReporter::default();
        let out = enrich_all(
            "scheduled-events",
            entities(EntityKind::ScheduledEvent),
            FailurePolicy::RouteToFailed,
            Duration::ZERO,
            &reporter,
            |_| async { Ok(Some(json!([1, 2]))) },
        )
        .await
        .unwrap();
        assert!(out.enriched.is_empty());
        assert_eq!(out.failed.len(), 3);
    }
}
