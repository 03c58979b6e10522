//! # Stream Indexer Shared
//!
//! This crate defines the data structures shared across the stream indexer.
//! It covers the typed-attribute representation used by the change stream,
//! the change records themselves, the plain documents produced from them and
//! the bulk operations that are finally written to the search engine.

pub mod types;

pub use types::attribute_value::{decode_image, decode_value, AttributeValue};
pub use types::bulk_operation::{BulkAction, BulkBatch, BulkOperation, VersionType};
pub use types::change_record::{ChangeRecord, EventKind, StreamEvent};
pub use types::document::{fields, Document, EntityType};
