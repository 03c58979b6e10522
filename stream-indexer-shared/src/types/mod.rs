//! This module defines the core data structures used across the stream indexer.
//! It re-exports the attribute decoder, change records, documents and bulk operations.

pub mod attribute_value;
pub mod bulk_operation;
pub mod change_record;
pub mod document;

pub use attribute_value::AttributeValue;
pub use bulk_operation::{BulkBatch, BulkOperation};
pub use change_record::{ChangeRecord, EventKind, StreamEvent};
pub use document::{Document, EntityType};
