//! Consumer module for the stream indexer ingest.
//!
//! Supplies the batches of change records the orchestrator processes, one
//! batch per invocation.

mod stdin_source;

pub use stdin_source::StdinEventSource;

use async_trait::async_trait;
use stream_indexer_shared::StreamEvent;

use crate::errors::IngestError;

/// Source of stream events.
///
/// Each returned event is one invocation's worth of change records. The
/// host is expected to redeliver an event whose invocation failed.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event. `Ok(None)` means the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<StreamEvent>, IngestError>;
}
