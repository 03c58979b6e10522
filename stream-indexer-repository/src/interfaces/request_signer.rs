//! Request signing seam.
//!
//! Managed search services require every request to be signed with
//! credentials scoped to a service name and region. The signing itself is
//! supplied by the host; this crate only defines where it plugs in.

use async_trait::async_trait;

use crate::errors::SearchIndexError;
use crate::types::EngineRequest;

/// Default service name used in the signing scope.
pub const DEFAULT_SIGNING_SERVICE: &str = "aoss";

/// Scope a signature is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningScope {
    /// Host name of the engine endpoint, without scheme.
    pub host: String,
    /// Service name, e.g. `aoss` or `es`.
    pub service: String,
    /// Region of the endpoint, when known.
    pub region: Option<String>,
}

impl SigningScope {
    pub fn new(host: impl Into<String>, service: impl Into<String>, region: Option<String>) -> Self {
        Self {
            host: host.into(),
            service: service.into(),
            region,
        }
    }
}

/// Produces authentication headers for a request.
///
/// The returned headers are attached to the request as-is; they must cover the
/// request exactly as given (method, path, headers and body).
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Sign a request, returning the headers to add.
    async fn sign(
        &self,
        request: &EngineRequest,
        scope: &SigningScope,
    ) -> Result<Vec<(String, String)>, SearchIndexError>;
}

/// Signer that adds nothing.
///
/// Used for local engines and for deployments that sign through a proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedRequests;

#[async_trait]
impl RequestSigner for UnsignedRequests {
    async fn sign(
        &self,
        _request: &EngineRequest,
        _scope: &SigningScope,
    ) -> Result<Vec<(String, String)>, SearchIndexError> {
        Ok(Vec::new())
    }
}
