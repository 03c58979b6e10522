//! Interface definitions for reaching the search engine.
//!
//! This module defines the `SearchEngineTransport` trait that the delivery
//! engine and index admin are written against, and the `RequestSigner` seam
//! through which the host supplies its request-signing capability.

mod request_signer;
mod search_engine_transport;

pub use request_signer::{RequestSigner, SigningScope, UnsignedRequests, DEFAULT_SIGNING_SERVICE};
pub use search_engine_transport::SearchEngineTransport;
