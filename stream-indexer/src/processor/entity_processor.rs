//! Entity processor implementation.
//!
//! Turns change records into routed, normalized documents ready for the
//! batch builder.

use tracing::{debug, instrument};

use super::normalizer::normalize;
use stream_indexer_shared::{ChangeRecord, Document, EntityType, EventKind};

/// Processed result from the entity processor.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedEvent {
    /// Document to be indexed (insert or modify).
    Index {
        id: String,
        entity_type: EntityType,
        document: Document,
        /// Source-side creation time of the record, in seconds.
        approximate_creation_time: Option<f64>,
    },
    /// Document to be deleted.
    Delete { id: String, entity_type: EntityType },
}

impl ProcessedEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Index { entity_type, .. } | Self::Delete { entity_type, .. } => *entity_type,
        }
    }
}

/// Processor that transforms change records into search documents.
///
/// The processor is responsible for:
/// - Decoding typed-attribute images into plain documents
/// - Routing by entity type and skipping kinds the index does not hold
/// - Repairing ambiguously typed fields before they reach the engine
#[derive(Debug, Default)]
pub struct EntityProcessor {}

impl EntityProcessor {
    /// Create a new entity processor.
    pub fn new() -> Self {
        Self {}
    }

    /// Process a batch of change records.
    ///
    /// Records that should not reach the index are skipped, never rejected,
    /// so the result may be shorter than the input (or empty).
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn process_batch(&self, records: Vec<ChangeRecord>) -> Vec<ProcessedEvent> {
        let processed: Vec<ProcessedEvent> = records
            .into_iter()
            .filter_map(|record| self.process_record(record))
            .collect();

        debug!(processed_count = processed.len(), "Processed record batch");
        processed
    }

    /// Process a single change record.
    pub fn process_record(&self, record: ChangeRecord) -> Option<ProcessedEvent> {
        let id = record.document_id();

        match record.event_kind {
            EventKind::Insert | EventKind::Modify => self.process_upsert(id, record),
            EventKind::Remove => self.process_remove(id, record),
            EventKind::Unknown => {
                debug!(id = %id, "Skipping record with unknown event name");
                None
            }
        }
    }

    fn process_upsert(&self, id: String, record: ChangeRecord) -> Option<ProcessedEvent> {
        let mut document = match record.decoded_new_image() {
            Some(image) if !image.is_empty() => Document::new(image),
            _ => {
                debug!(id = %id, "Skipping record without a new image");
                return None;
            }
        };

        let entity_type = match document.entity_type() {
            Some(entity_type) => entity_type,
            None => {
                debug!(
                    id = %id,
                    entity_type = ?document.entity_type_name(),
                    "Skipping unrecognized entity type"
                );
                return None;
            }
        };

        normalize(&mut document);

        Some(ProcessedEvent::Index {
            id,
            entity_type,
            document,
            approximate_creation_time: record.approximate_creation_time,
        })
    }

    /// Removals carry no new image; the old image decides the target index
    /// when the stream provides one.
    fn process_remove(&self, id: String, record: ChangeRecord) -> Option<ProcessedEvent> {
        let old_document = record
            .decoded_old_image()
            .filter(|image| !image.is_empty())
            .map(Document::new);

        let entity_type = match old_document {
            None => EntityType::Save,
            Some(document) => match document.entity_type() {
                Some(entity_type) => entity_type,
                None => {
                    debug!(
                        id = %id,
                        entity_type = ?document.entity_type_name(),
                        "Skipping removal of unrecognized entity type"
                    );
                    return None;
                }
            },
        };

        Some(ProcessedEvent::Delete { id, entity_type })
    }
}
