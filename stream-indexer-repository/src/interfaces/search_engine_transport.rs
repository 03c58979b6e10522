//! Search engine transport trait definition.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::{EngineRequest, EngineResponse};

/// Sends raw requests to the search engine.
///
/// Implementations sign the request, send it and hand back the status and
/// body without interpreting them. Classification of responses is the job of
/// the caller (see `BulkDeliveryEngine` and `IndexAdmin`), which keeps retry
/// behavior testable with a mock transport.
///
/// # Errors
///
/// Only failures to produce a response at all (signing, connection, I/O) are
/// returned as `Err`. Any HTTP status, including 4xx and 5xx, is an `Ok`.
#[async_trait]
pub trait SearchEngineTransport: Send + Sync {
    /// Sign and send a request, returning the raw response.
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, SearchIndexError>;
}
