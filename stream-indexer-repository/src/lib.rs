//! # Stream Indexer Repository
//!
//! This crate holds everything that talks to the search engine. It defines
//! the transport and request-signing seams, an OpenSearch transport, the bulk
//! delivery engine with its retry policy, and the index administration
//! operations used by operators.

pub mod admin;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;
pub mod utils;

pub use admin::IndexAdmin;
pub use config::{DeliveryConfig, RetryPolicy};
pub use delivery::{AttemptOutcome, BulkDeliveryEngine, ResponseClass};
pub use errors::SearchIndexError;
pub use interfaces::{RequestSigner, SearchEngineTransport, SigningScope, UnsignedRequests};
pub use opensearch::{IndexConfig, OpenSearchTransport, DEFAULT_PRIMARY_INDEX, DEFAULT_TAG_INDEX};
pub use types::{AdminReport, DeliveryReport, EngineRequest, EngineResponse, HttpMethod};
pub use utils::{truncate_snippet, validate_index_name};
