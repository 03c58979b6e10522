//! Loader module for the stream indexer ingest.
//!
//! Builds one bulk batch from the processed events of an invocation and hands
//! it to the delivery engine.

mod batch_builder;

pub use batch_builder::{compute_version, BatchBuilder, IndexRouting};

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::errors::IngestError;
use crate::processor::ProcessedEvent;
use stream_indexer_repository::{
    BulkDeliveryEngine, DeliveryConfig, DeliveryReport, SearchEngineTransport,
};

/// What a load call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadResult {
    /// Nothing to send; the engine was not contacted.
    NoOp,
    /// The batch was applied.
    Delivered(DeliveryReport),
}

/// Loader that writes processed events into the search engine.
///
/// The loader is responsible for:
/// - Routing each event to its index and versioning index operations
/// - Skipping delivery when an invocation produced no operations
/// - Surfacing terminal delivery failures to the caller
pub struct SearchLoader {
    builder: BatchBuilder,
    engine: BulkDeliveryEngine,
}

impl SearchLoader {
    /// Create a new search loader.
    pub fn new(builder: BatchBuilder, engine: BulkDeliveryEngine) -> Self {
        Self { builder, engine }
    }

    /// Create a loader over a transport with the default retry policy.
    pub fn from_transport(transport: Arc<dyn SearchEngineTransport>, routing: IndexRouting) -> Self {
        Self::new(BatchBuilder::new(routing), BulkDeliveryEngine::new(transport))
    }

    /// Create a loader over a transport with custom delivery configuration.
    pub fn with_config(
        transport: Arc<dyn SearchEngineTransport>,
        routing: IndexRouting,
        config: DeliveryConfig,
    ) -> Self {
        Self::new(
            BatchBuilder::new(routing),
            BulkDeliveryEngine::with_config(transport, config),
        )
    }

    pub fn routing(&self) -> &IndexRouting {
        self.builder.routing()
    }

    /// Build and deliver one batch.
    ///
    /// Returns once the engine has applied the batch, or with the terminal
    /// failure that ended delivery.
    #[instrument(skip(self, events), fields(event_count = events.len()))]
    pub async fn load(&self, events: Vec<ProcessedEvent>) -> Result<LoadResult, IngestError> {
        let batch = self.builder.build(events);

        if batch.is_empty() {
            debug!("No operations to deliver");
            return Ok(LoadResult::NoOp);
        }

        let report = self.engine.deliver(&batch).await?;
        Ok(LoadResult::Delivered(report))
    }
}
