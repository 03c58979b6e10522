//! Builds the bulk batch for one invocation.

use chrono::Utc;
use serde_json::Value;
use stream_indexer_repository::IndexConfig;
use stream_indexer_shared::{fields, BulkBatch, BulkOperation, Document, EntityType};
use tracing::debug;

use crate::processor::ProcessedEvent;

/// Maps entity types to the index that holds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRouting {
    primary_index: String,
    tag_index: String,
}

impl IndexRouting {
    pub fn new(config: IndexConfig) -> Self {
        Self {
            primary_index: config.primary_index,
            tag_index: config.tag_index,
        }
    }

    /// Target index for an entity type.
    pub fn index_for(&self, entity_type: EntityType) -> &str {
        match entity_type {
            EntityType::Save => &self.primary_index,
            EntityType::DiscoverTag => &self.tag_index,
        }
    }
}

impl Default for IndexRouting {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl From<IndexConfig> for IndexRouting {
    fn from(config: IndexConfig) -> Self {
        Self::new(config)
    }
}

/// Turns processed events into an ordered bulk batch.
#[derive(Debug, Clone, Default)]
pub struct BatchBuilder {
    routing: IndexRouting,
}

impl BatchBuilder {
    pub fn new(routing: IndexRouting) -> Self {
        Self { routing }
    }

    pub fn routing(&self) -> &IndexRouting {
        &self.routing
    }

    /// Build the batch, using the current time as the last-resort version.
    pub fn build(&self, events: Vec<ProcessedEvent>) -> BulkBatch {
        self.build_at(events, Utc::now().timestamp_millis())
    }

    /// Build the batch with an explicit wall-clock time in milliseconds.
    pub fn build_at(&self, events: Vec<ProcessedEvent>, now_ms: i64) -> BulkBatch {
        let batch: BulkBatch = events
            .into_iter()
            .map(|event| match event {
                ProcessedEvent::Index {
                    id,
                    entity_type,
                    document,
                    approximate_creation_time,
                } => {
                    let version = compute_version(&document, approximate_creation_time, now_ms);
                    BulkOperation::index(self.routing.index_for(entity_type), id, version, document)
                }
                ProcessedEvent::Delete { id, entity_type } => {
                    BulkOperation::delete(self.routing.index_for(entity_type), id)
                }
            })
            .collect();

        debug!(operation_count = batch.len(), "Built bulk batch");
        batch
    }
}

/// External version for a document, in milliseconds.
///
/// Taken from the document's `updatedAt` (or legacy `timestamp`), else the
/// record's source-side creation time, else `now_ms`. Fractions are truncated.
pub fn compute_version(
    document: &Document,
    approximate_creation_time: Option<f64>,
    now_ms: i64,
) -> i64 {
    if let Some(version) = document
        .get(fields::UPDATED_AT)
        .and_then(positive_number)
        .or_else(|| document.get(fields::TIMESTAMP).and_then(positive_number))
    {
        return version;
    }

    approximate_creation_time
        .map(|seconds| seconds * 1000.0)
        .and_then(positive_millis)
        .unwrap_or(now_ms)
}

fn positive_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(positive_millis),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(positive_millis),
        _ => None,
    }
}

fn positive_millis(value: f64) -> Option<i64> {
    (value.is_finite() && value >= 1.0 && value < i64::MAX as f64).then(|| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stream_indexer_shared::BulkAction;

    const NOW_MS: i64 = 1_750_000_000_000;

    fn document(value: Value) -> Document {
        Document::new(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_version_prefers_updated_at() {
        let doc = document(json!({"updatedAt": 1_718_000_000_123i64, "timestamp": 5}));
        assert_eq!(compute_version(&doc, Some(1_600_000_000.0), NOW_MS), 1_718_000_000_123);

        let doc = document(json!({"updatedAt": "1718000000456"}));
        assert_eq!(compute_version(&doc, None, NOW_MS), 1_718_000_000_456);

        let doc = document(json!({"updatedAt": 1718000000123.9}));
        assert_eq!(compute_version(&doc, None, NOW_MS), 1_718_000_000_123);
    }

    #[test]
    fn test_version_falls_back_to_timestamp() {
        let doc = document(json!({"updatedAt": "2024-06-10T00:00:00Z", "timestamp": 1_700_000_000_000i64}));
        assert_eq!(compute_version(&doc, None, NOW_MS), 1_700_000_000_000);
    }

    #[test]
    fn test_version_falls_back_to_creation_time() {
        let doc = document(json!({"updatedAt": 0}));
        assert_eq!(compute_version(&doc, Some(1_718_000_000.5), NOW_MS), 1_718_000_000_500);
    }

    #[test]
    fn test_version_falls_back_to_now() {
        let doc = document(json!({"updatedAt": false}));
        assert_eq!(compute_version(&doc, None, NOW_MS), NOW_MS);
        assert_eq!(compute_version(&doc, Some(0.0), NOW_MS), NOW_MS);
    }

    #[test]
    fn test_routing() {
        let routing = IndexRouting::new(IndexConfig::new("saves-v2", "tags-v2"));
        assert_eq!(routing.index_for(EntityType::Save), "saves-v2");
        assert_eq!(routing.index_for(EntityType::DiscoverTag), "tags-v2");
    }

    #[test]
    fn test_build_index_and_delete() {
        let builder = BatchBuilder::default();
        let events = vec![
            ProcessedEvent::Index {
                id: "tag#coffee".to_string(),
                entity_type: EntityType::DiscoverTag,
                document: document(json!({"entityType": "DiscoverTag", "updatedAt": 10})),
                approximate_creation_time: None,
            },
            ProcessedEvent::Delete {
                id: "user1#save1".to_string(),
                entity_type: EntityType::Save,
            },
        ];

        let batch = builder.build_at(events, NOW_MS);
        let ops = batch.operations();
        assert_eq!(ops.len(), 2);

        assert_eq!(ops[0].action(), BulkAction::Index);
        assert_eq!(ops[0].index_name(), "discovertags");
        assert_eq!(
            ops[0].action_line(),
            json!({"index": {"_index": "discovertags", "_id": "tag#coffee", "version": 10, "version_type": "external_gte"}})
        );

        assert_eq!(ops[1].action(), BulkAction::Delete);
        assert_eq!(ops[1].index_name(), "saves");
        assert!(ops[1].body().is_none());
    }

    #[test]
    fn test_build_empty() {
        assert!(BatchBuilder::default().build(Vec::new()).is_empty());
    }
}
