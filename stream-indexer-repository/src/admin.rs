//! Index administration.
//!
//! Operator-invoked create, verify and delete calls. These are not on the hot
//! path, so a non-success status is reported straight back without retries.

use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::errors::SearchIndexError;
use crate::interfaces::SearchEngineTransport;
use crate::opensearch::index_config::index_mapping;
use crate::types::{AdminReport, EngineRequest, EngineResponse};
use crate::utils::{truncate_snippet, validate_index_name, SNIPPET_MAX_CHARS};

/// Creates, verifies and deletes indices through a signed transport.
pub struct IndexAdmin {
    transport: Arc<dyn SearchEngineTransport>,
}

impl IndexAdmin {
    pub fn new(transport: Arc<dyn SearchEngineTransport>) -> Self {
        Self { transport }
    }

    /// Create an index with the fixed mapping.
    ///
    /// # Returns
    ///
    /// * `Ok(AdminReport)` - If the engine accepted the mapping
    /// * `Err(SearchIndexError)` - If the name is invalid, the call fails, or
    ///   the engine answers with a non-2xx status (including "already exists")
    #[instrument(skip(self))]
    pub async fn create_index(&self, index: &str) -> Result<AdminReport, SearchIndexError> {
        validate_index_name(index)?;
        let body = serde_json::to_string(&index_mapping())?;
        let response = self
            .transport
            .send(EngineRequest::put_json(format!("/{}", index), body))
            .await?;
        Self::report("Create", index, response)
    }

    /// Check that an index exists.
    #[instrument(skip(self))]
    pub async fn verify_index(&self, index: &str) -> Result<AdminReport, SearchIndexError> {
        validate_index_name(index)?;
        let response = self
            .transport
            .send(EngineRequest::get(format!("/{}", index)))
            .await?;
        Self::report("Verify", index, response)
    }

    /// Delete an index and all of its documents.
    #[instrument(skip(self))]
    pub async fn delete_index(&self, index: &str) -> Result<AdminReport, SearchIndexError> {
        validate_index_name(index)?;
        let response = self
            .transport
            .send(EngineRequest::delete(format!("/{}", index)))
            .await?;
        Self::report("Delete", index, response)
    }

    fn report(
        operation: &'static str,
        index: &str,
        response: EngineResponse,
    ) -> Result<AdminReport, SearchIndexError> {
        if !response.is_success() {
            let snippet = truncate_snippet(&response.body, SNIPPET_MAX_CHARS);
            error!(
                operation = operation,
                index = %index,
                status = response.status,
                body = %snippet,
                "Index administration request failed"
            );
            return Err(SearchIndexError::index_admin(
                operation,
                index,
                response.status,
                snippet,
            ));
        }

        info!(
            operation = operation,
            index = %index,
            status = response.status,
            "Index administration request succeeded"
        );
        Ok(AdminReport {
            index: index.to_string(),
            status: response.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Mock transport answering every request with a fixed status.
    struct FixedStatusTransport {
        status: u16,
        requests: Mutex<Vec<EngineRequest>>,
    }

    impl FixedStatusTransport {
        fn new(status: u16) -> Self {
            Self {
                status,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchEngineTransport for FixedStatusTransport {
        async fn send(&self, request: EngineRequest) -> Result<EngineResponse, SearchIndexError> {
            self.requests.lock().unwrap().push(request);
            Ok(EngineResponse::new(self.status, r#"{"acknowledged":true}"#))
        }
    }

    #[tokio::test]
    async fn test_create_index_sends_mapping() {
        let transport = Arc::new(FixedStatusTransport::new(200));
        let admin = IndexAdmin::new(transport.clone());

        let report = admin.create_index("saves").await.unwrap();
        assert_eq!(report.index, "saves");
        assert_eq!(report.status, 200);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(requests[0].path, "/saves");
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, index_mapping());
    }

    #[tokio::test]
    async fn test_verify_and_delete_methods() {
        let transport = Arc::new(FixedStatusTransport::new(200));
        let admin = IndexAdmin::new(transport.clone());

        admin.verify_index("discovertags").await.unwrap();
        admin.delete_index("discovertags").await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert!(requests.iter().all(|r| r.path == "/discovertags"));
        assert!(requests.iter().all(|r| r.body.is_none()));
    }

    #[tokio::test]
    async fn test_missing_index_reports_status() {
        let admin = IndexAdmin::new(Arc::new(FixedStatusTransport::new(404)));

        let err = admin.verify_index("saves").await.unwrap_err();
        assert!(matches!(
            err,
            SearchIndexError::IndexAdminError {
                operation: "Verify",
                status: 404,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_sends_nothing() {
        let transport = Arc::new(FixedStatusTransport::new(200));
        let admin = IndexAdmin::new(transport.clone());

        let err = admin.delete_index("Saves/../x").await.unwrap_err();
        assert!(matches!(err, SearchIndexError::ValidationError(_)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }
}
