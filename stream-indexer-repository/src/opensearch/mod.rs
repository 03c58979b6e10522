//! OpenSearch implementation of the search engine transport.
//!
//! This module provides a concrete implementation of `SearchEngineTransport`
//! using OpenSearch as the backend, plus the index names and mapping.

pub mod index_config;
mod transport;

pub use index_config::{index_mapping, IndexConfig, DEFAULT_PRIMARY_INDEX, DEFAULT_TAG_INDEX};
pub use transport::{OpenSearchTransport, DEFAULT_REQUEST_TIMEOUT};
