use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::enrich::FailurePolicy;

/// Kind of top-level record pulled from the vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Video,
    ScheduledEvent,
}

impl EntityKind {
    /// Field carrying the timestamp the enrichment date range is derived from.
    #[must_use]
    pub fn timestamp_field(self) -> &'static str {
        match self {
            Self::Video => "whenUploaded",
            Self::ScheduledEvent => "startDate",
        }
    }

    #[must_use]
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Video => FailurePolicy::KeepEmpty,
            Self::ScheduledEvent => FailurePolicy::RouteToFailed,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::ScheduledEvent => "scheduled-events",
        }
    }
}

/// A video or scheduled event as returned by the vendor listing.
///
/// `fields` holds the full object as returned, `id` included.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: String,
    pub timestamp: Option<String>,
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Builds an entity from a listing item. Returns `None` when the item is
    /// not an object or has no usable `id`.
    #[must_use]
    pub fn from_value(kind: EntityKind, value: Value) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = match fields.get("id")? {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_owned(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let timestamp = fields
            .get(kind.timestamp_field())
            .and_then(Value::as_str)
            .map(str::to_owned);
        Some(Self {
            kind,
            id,
            timestamp,
            fields,
        })
    }

    /// `YYYY-MM-DD` prefix of the entity's timestamp.
    #[must_use]
    pub fn date_prefix(&self) -> Option<&str> {
        self.timestamp.as_deref().and_then(|ts| ts.get(..10))
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.fields
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// Converts listing items to entities, skipping items without an id and
/// repeated ids. Order is preserved.
#[must_use]
pub fn entities_from_values(kind: EntityKind, values: Vec<Value>) -> Vec<Entity> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entities = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match Entity::from_value(kind, value) {
            Some(entity) => {
                if seen.insert(entity.id.clone()) {
                    entities.push(entity);
                } else {
                    tracing::warn!(kind = kind.label(), id = %entity.id, "duplicate id in listing, skipping");
                }
            }
            None => {
                tracing::warn!(kind = kind.label(), index, "listing item has no usable id, skipping");
            }
        }
    }
    entities
}
