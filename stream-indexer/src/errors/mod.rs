//! Error types for the stream indexer ingest.

use stream_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur in the stream indexer ingest.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The search engine refused or could not apply a batch.
    #[error("Delivery error: {0}")]
    DeliveryError(#[from] SearchIndexError),

    /// Error reading from the event source.
    #[error("Read error: {0}")]
    ReadError(String),

    /// Error parsing or decoding data.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error writing an invocation result.
    #[error("Sink error: {0}")]
    SinkError(String),
}

impl IngestError {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a sink error.
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::SinkError(msg.into())
    }

    /// HTTP status of the failed delivery, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::DeliveryError(e) => e.status(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::ReadError(err.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
