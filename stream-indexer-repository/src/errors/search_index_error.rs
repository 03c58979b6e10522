//! Search index error types.
//!
//! This module defines the unified error type for all search engine operations,
//! from transport and signing problems up to classified bulk delivery failures.

use thiserror::Error;

/// Unified errors from search engine operations.
///
/// Every variant is terminal from the point of view of the caller: transient
/// conditions are retried inside the delivery engine and only surface here once
/// the attempt budget is spent.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., an invalid index name).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to reach the search engine or read its response.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The signing capability refused or failed to sign a request.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The bulk request was accepted but some items failed.
    #[error("Bulk partial errors: {snippet}")]
    BulkPartialFailure { snippet: String },

    /// The bulk request was rejected with a non-retriable status.
    #[error("Bulk failed with status {status}: {snippet}")]
    BulkRejected { status: u16, snippet: String },

    /// Every delivery attempt hit a retriable status.
    #[error("Bulk failed with status {status} after {attempts} attempts: {snippet}")]
    RetriesExhausted {
        attempts: u32,
        status: u16,
        snippet: String,
    },

    /// An index administration call returned a non-success status.
    #[error("{operation} of index '{index}' failed with status {status}: {snippet}")]
    IndexAdminError {
        operation: &'static str,
        index: String,
        status: u16,
        snippet: String,
    },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a signing error.
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::SigningError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a bulk partial failure error.
    pub fn bulk_partial_failure(snippet: impl Into<String>) -> Self {
        Self::BulkPartialFailure {
            snippet: snippet.into(),
        }
    }

    /// Create a bulk rejection error.
    pub fn bulk_rejected(status: u16, snippet: impl Into<String>) -> Self {
        Self::BulkRejected {
            status,
            snippet: snippet.into(),
        }
    }

    /// Create a retries exhausted error.
    pub fn retries_exhausted(attempts: u32, status: u16, snippet: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            attempts,
            status,
            snippet: snippet.into(),
        }
    }

    /// Create an index administration error.
    pub fn index_admin(
        operation: &'static str,
        index: impl Into<String>,
        status: u16,
        snippet: impl Into<String>,
    ) -> Self {
        Self::IndexAdminError {
            operation,
            index: index.into(),
            status,
            snippet: snippet.into(),
        }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// The HTTP status that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BulkRejected { status, .. }
            | Self::RetriesExhausted { status, .. }
            | Self::IndexAdminError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SearchIndexError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        assert_eq!(SearchIndexError::bulk_rejected(400, "bad").status(), Some(400));
        assert_eq!(
            SearchIndexError::retries_exhausted(4, 503, "busy").status(),
            Some(503)
        );
        assert_eq!(SearchIndexError::bulk_partial_failure("x").status(), None);
    }

    #[test]
    fn test_display_includes_diagnostics() {
        let err = SearchIndexError::retries_exhausted(4, 503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "Bulk failed with status 503 after 4 attempts: Service Unavailable"
        );

        let err = SearchIndexError::index_admin("Create", "saves", 400, "exists");
        assert_eq!(
            err.to_string(),
            "Create of index 'saves' failed with status 400: exists"
        );
    }
}
