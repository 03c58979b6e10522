//! # Stream Indexer
//!
//! Propagates change events from a table's change stream into the search
//! index, keeping the index eventually consistent with the table.
//!
//! ## Architecture
//!
//! The indexer follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Supplies batches of change records
//! 2. **Processor**: Decodes, routes and normalizes records into documents
//! 3. **Enrichment**: Tags saves with semantic categories (best-effort)
//! 4. **Loader**: Builds a versioned bulk batch and delivers it
//! 5. **Orchestrator**: Coordinates one invocation at a time
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Event sources
//! - [`processor`]: Transforms change records into documents
//! - [`enrichment`]: Semantic tagging client
//! - [`loader`]: Batch building and delivery
//! - [`orchestrator`]: Coordinates the ingest flow
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod consumer;
pub mod enrichment;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use config::{Dependencies, IndexerConfig, LogFormat, LoggingConfig};
pub use errors::IngestError;
pub use orchestrator::{InvocationResult, Orchestrator};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
