//! Orchestrator module for the stream indexer ingest.
//!
//! Coordinates the processor, enrichment and loader components for each
//! invocation, and drives invocations from an event source.

mod sink;

pub use sink::{JsonLineSink, ResultSink};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::consumer::EventSource;
use crate::enrichment::{Enricher, EnrichmentInput};
use crate::errors::IngestError;
use crate::loader::{LoadResult, SearchLoader};
use crate::processor::{EntityProcessor, ProcessedEvent};
use stream_indexer_shared::{fields, StreamEvent};

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Ask the enricher whether each save is broken and record it as `isBroken`.
    pub detect_broken: bool,
}

/// Outcome of one invocation, reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum InvocationResult {
    /// The batch was applied; `items` is the count the engine reported.
    Ok { items: usize },
    /// No record produced an operation; the engine was not contacted.
    NoOp,
}

/// Totals over a run of invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub invocations: u64,
    pub no_ops: u64,
    pub items_indexed: u64,
}

impl RunSummary {
    fn record(&mut self, result: &InvocationResult) {
        self.invocations += 1;
        match result {
            InvocationResult::Ok { items } => self.items_indexed += *items as u64,
            InvocationResult::NoOp => self.no_ops += 1,
        }
    }
}

/// Orchestrator that coordinates the ingest components.
///
/// One invocation runs to completion (decode, route, normalize, enrich,
/// build, deliver) before the next one starts.
pub struct Orchestrator {
    processor: EntityProcessor,
    enricher: Arc<dyn Enricher>,
    loader: SearchLoader,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(processor: EntityProcessor, enricher: Arc<dyn Enricher>, loader: SearchLoader) -> Self {
        Self::with_config(processor, enricher, loader, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        processor: EntityProcessor,
        enricher: Arc<dyn Enricher>,
        loader: SearchLoader,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            processor,
            enricher,
            loader,
            config,
        }
    }

    /// Handle one stream event.
    ///
    /// # Returns
    ///
    /// * `Ok(InvocationResult)` - The batch was applied, or there was nothing to apply
    /// * `Err(IngestError)` - A terminal delivery failure; the host should redeliver
    #[instrument(
        skip(self, event),
        fields(invocation_id = %Uuid::new_v4(), record_count = event.records.len())
    )]
    pub async fn handle(&self, event: StreamEvent) -> Result<InvocationResult, IngestError> {
        info!("Stream indexer invoked");

        let mut processed = self.processor.process_batch(event.records);
        self.enrich(&mut processed).await;

        match self.loader.load(processed).await? {
            LoadResult::NoOp => {
                debug!("No operations generated from event");
                Ok(InvocationResult::NoOp)
            }
            LoadResult::Delivered(report) => {
                info!(
                    items = report.items,
                    attempts = report.attempts,
                    "Invocation completed"
                );
                Ok(InvocationResult::Ok {
                    items: report.items,
                })
            }
        }
    }

    /// Attach enrichment tags (and the broken flag, when enabled) to saves.
    async fn enrich(&self, events: &mut [ProcessedEvent]) {
        if !self.enricher.is_enabled() {
            return;
        }

        for event in events.iter_mut() {
            let ProcessedEvent::Index {
                id,
                entity_type,
                document,
                ..
            } = event
            else {
                continue;
            };
            if !entity_type.is_enrichable() {
                continue;
            }

            let input = EnrichmentInput::from_document(document);
            let tags = self.enricher.generate_enrichments(&input).await.into_tags();
            debug!(id = %id, tag_count = tags.len(), "Enriched document");
            document.insert(
                fields::ENRICHMENTS,
                Value::Array(tags.into_iter().map(Value::String).collect()),
            );

            if self.config.detect_broken {
                let check = self.enricher.detect_broken(&input).await;
                document.insert(fields::IS_BROKEN, Value::Bool(check.is_broken()));
            }
        }
    }

    /// Run invocations from a source until it is exhausted or a shutdown
    /// signal arrives.
    ///
    /// Each result is written to `sink`. The first failed invocation stops
    /// the run and is returned, so the host can redeliver it.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        source: &mut dyn EventSource,
        sink: &mut dyn ResultSink,
    ) -> Result<RunSummary, IngestError> {
        info!("Starting stream indexer orchestrator");
        let mut summary = RunSummary::default();

        loop {
            let next = tokio::select! {
                next = source.next_event() => next?,
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            };

            let Some(event) = next else {
                info!("Event source exhausted");
                break;
            };

            match self.handle(event).await {
                Ok(result) => {
                    summary.record(&result);
                    sink.write_result(&result).await?;
                }
                Err(e) => {
                    error!(error = %e, status = ?e.status(), "Invocation failed");
                    return Err(e);
                }
            }
        }

        info!(
            invocations = summary.invocations,
            no_ops = summary.no_ops,
            items_indexed = summary.items_indexed,
            "Orchestrator shutdown complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_result_wire_shape() {
        assert_eq!(
            serde_json::to_value(InvocationResult::Ok { items: 3 }).unwrap(),
            json!({"status": "ok", "items": 3})
        );
        assert_eq!(
            serde_json::to_value(InvocationResult::NoOp).unwrap(),
            json!({"status": "no-op"})
        );
    }

    #[test]
    fn test_run_summary_totals() {
        let mut summary = RunSummary::default();
        summary.record(&InvocationResult::Ok { items: 2 });
        summary.record(&InvocationResult::NoOp);
        summary.record(&InvocationResult::Ok { items: 5 });

        assert_eq!(
            summary,
            RunSummary {
                invocations: 3,
                no_ops: 1,
                items_indexed: 7
            }
        );
    }
}
