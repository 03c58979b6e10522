//! OpenSearch transport implementation.
//!
//! This module provides the concrete implementation of `SearchEngineTransport`
//! using the OpenSearch Rust crate, with every request passed through the
//! injected `RequestSigner` first.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::{
        headers::{HeaderMap, HeaderName, HeaderValue},
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method,
    },
    OpenSearch,
};
use tracing::{debug, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::{RequestSigner, SearchEngineTransport, SigningScope};
use crate::types::{EngineRequest, EngineResponse, HttpMethod};

/// Default timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenSearch transport.
///
/// # Example
///
/// ```ignore
/// use stream_indexer_repository::{OpenSearchTransport, UnsignedRequests};
///
/// let transport = OpenSearchTransport::new(
///     "https://search.example.com",
///     Arc::new(UnsignedRequests),
///     "aoss",
///     Some("us-east-1".to_string()),
/// )?;
/// let response = transport.send(EngineRequest::get("/saves")).await?;
/// ```
pub struct OpenSearchTransport {
    client: OpenSearch,
    signer: Arc<dyn RequestSigner>,
    scope: SigningScope,
    timeout: Duration,
}

impl OpenSearchTransport {
    /// Create a transport connected to the specified endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The engine URL (e.g., "https://abc.us-east-1.aoss.amazonaws.com")
    /// * `signer` - Signing capability applied to each request
    /// * `service` - Service name the signature is scoped to
    /// * `region` - Region the signature is scoped to
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchTransport)` - A new transport instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub fn new(
        endpoint: &str,
        signer: Arc<dyn RequestSigner>,
        service: &str,
        region: Option<String>,
    ) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(endpoint).map_err(|e| SearchIndexError::connection(e.to_string()))?;
        let host = parsed_url
            .host_str()
            .ok_or_else(|| SearchIndexError::connection(format!("No host in {}", endpoint)))?
            .to_string();

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            endpoint = %endpoint,
            service = %service,
            region = ?region,
            "Created OpenSearch transport"
        );

        Ok(Self {
            client,
            signer,
            scope: SigningScope::new(host, service, region),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn scope(&self) -> &SigningScope {
        &self.scope
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::Get,
            HttpMethod::Put => Method::Put,
            HttpMethod::Post => Method::Post,
            HttpMethod::Delete => Method::Delete,
            HttpMethod::Head => Method::Head,
        }
    }

    /// Build a header map from name/value pairs.
    fn header_map<'a>(
        headers: impl IntoIterator<Item = &'a (String, String)>,
    ) -> Result<HeaderMap, SearchIndexError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SearchIndexError::validation(format!("Header '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SearchIndexError::validation(format!("Header '{}': {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Keep a response body, turning a failed read into a connection error.
fn response_body<E: std::fmt::Display>(
    status: u16,
    read: Result<String, E>,
) -> Result<String, SearchIndexError> {
    read.map_err(|e| {
        debug!(status = status, error = %e, "Failed to read search engine response body");
        SearchIndexError::connection(format!("Failed to read response body (status {}): {}", status, e))
    })
}

#[async_trait]
impl SearchEngineTransport for OpenSearchTransport {
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, SearchIndexError> {
        let signature = self.signer.sign(&request, &self.scope).await?;
        let headers = Self::header_map(request.headers.iter().chain(signature.iter()))?;

        let response = self
            .client
            .send::<String, ()>(
                Self::method(request.method),
                &request.path,
                headers,
                None,
                request.body,
                Some(self.timeout),
            )
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code().as_u16();
        let body = response_body(status, response.text().await)?;

        debug!(
            method = request.method.as_str(),
            path = %request.path,
            status = status,
            "Search engine request completed"
        );

        Ok(EngineResponse { status, body })
    }
}
