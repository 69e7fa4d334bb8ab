//! Realtime store schemas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::core::{BeadId, DoneSet};

/// One appended entry as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Completed bead id. Older stores wrote this field as `text`.
    #[serde(alias = "text")]
    pub value: i64,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl StoreRecord {
    pub fn new(id: BeadId, created_at: OffsetDateTime) -> Self {
        Self {
            value: i64::from(id.get()),
            created_at: Some(created_at),
        }
    }
}

/// Full store contents keyed by entry key.
pub type StoreSnapshot = BTreeMap<String, StoreRecord>;

/// Result of turning a raw snapshot into a done set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    pub done: DoneSet,
    /// Entries that did not match the record schema or held an id out of range.
    pub rejected: usize,
}

/// Extract the done set from a raw snapshot.
///
/// Accepts an object of entries, an array of entries, or null (no entries).
/// Malformed entries are counted and skipped rather than coerced.
pub fn ingest_snapshot(raw: &Value) -> Ingested {
    let entries: Vec<&Value> = match raw {
        Value::Null => Vec::new(),
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => {
            return Ingested {
                done: DoneSet::new(),
                rejected: 1,
            };
        }
    };

    let mut ingested = Ingested::default();
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        match StoreRecord::deserialize(entry)
            .ok()
            .and_then(|record| BeadId::new(record.value).ok())
        {
            Some(id) => ids.push(id),
            None => ingested.rejected += 1,
        }
    }
    ingested.done = ids.into_iter().collect();
    ingested
}
