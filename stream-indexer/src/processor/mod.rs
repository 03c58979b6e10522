//! Processor module for the stream indexer ingest.
//!
//! Decodes change records, routes them by entity type and normalizes the
//! resulting documents.

mod entity_processor;
pub mod normalizer;

pub use entity_processor::{EntityProcessor, ProcessedEvent};
pub use normalizer::normalize;
