//! Bulk delivery engine.
//!
//! Sends one bulk batch to the engine's `_bulk` endpoint and classifies the
//! outcome:
//!
//! - 2xx without item errors: success.
//! - 2xx with `"errors": true`: terminal, never retried.
//! - 429 or 5xx: retried with exponential backoff up to the attempt ceiling.
//! - anything else, or an exhausted attempt budget: terminal.
//!
//! Each attempt resolves to an [`AttemptOutcome`], so the schedule can be
//! checked without a running engine.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use stream_indexer_shared::BulkBatch;

use crate::config::DeliveryConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchEngineTransport;
use crate::types::{DeliveryReport, EngineRequest, EngineResponse};
use crate::utils::truncate_snippet;

/// Path of the bulk endpoint. Every action line names its own index.
pub const BULK_PATH: &str = "/_bulk";

/// Classification of a single bulk response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx and no item reported an error.
    Success { items: usize },
    /// 2xx but at least one item failed.
    PartialFailure,
    /// 2xx with a body that is not a bulk response.
    Malformed,
    /// Rate limited or server error.
    Retriable,
    /// Any other status.
    Rejected,
}

/// What the engine should do after one attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Success { items: usize },
    RetryAfter(Duration),
    TerminalFailure(SearchIndexError),
}

/// Classify a bulk response by status and body.
pub fn classify_response(status: u16, body: &str) -> ResponseClass {
    match status {
        200..=299 => match serde_json::from_str::<Value>(body) {
            Ok(parsed) if parsed.is_object() => {
                if parsed.get("errors").and_then(Value::as_bool).unwrap_or(false) {
                    ResponseClass::PartialFailure
                } else {
                    let items = parsed
                        .get("items")
                        .and_then(Value::as_array)
                        .map_or(0, Vec::len);
                    ResponseClass::Success { items }
                }
            }
            _ => ResponseClass::Malformed,
        },
        429 | 500..=599 => ResponseClass::Retriable,
        _ => ResponseClass::Rejected,
    }
}

/// Delivers bulk batches through a signed transport.
///
/// # Example
///
/// ```ignore
/// let engine = BulkDeliveryEngine::new(Arc::new(transport));
/// let report = engine.deliver(&batch).await?;
/// println!("{} items in {} attempts", report.items, report.attempts);
/// ```
pub struct BulkDeliveryEngine {
    transport: Arc<dyn SearchEngineTransport>,
    config: DeliveryConfig,
}

impl BulkDeliveryEngine {
    /// Create an engine with the default retry policy.
    pub fn new(transport: Arc<dyn SearchEngineTransport>) -> Self {
        Self {
            transport,
            config: DeliveryConfig::default(),
        }
    }

    /// Create an engine with custom configuration.
    pub fn with_config(transport: Arc<dyn SearchEngineTransport>, config: DeliveryConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Decide what follows the given attempt's response.
    pub fn evaluate_attempt(&self, attempt: u32, response: &EngineResponse) -> AttemptOutcome {
        let policy = &self.config.retry;
        let snippet = || truncate_snippet(&response.body, self.config.snippet_max_chars);

        match classify_response(response.status, &response.body) {
            ResponseClass::Success { items } => AttemptOutcome::Success { items },
            ResponseClass::PartialFailure => {
                AttemptOutcome::TerminalFailure(SearchIndexError::bulk_partial_failure(snippet()))
            }
            ResponseClass::Malformed => AttemptOutcome::TerminalFailure(SearchIndexError::parse(
                format!("Unreadable bulk response: {}", snippet()),
            )),
            ResponseClass::Retriable if policy.allows_retry_after(attempt) => {
                AttemptOutcome::RetryAfter(policy.backoff_for(attempt))
            }
            ResponseClass::Retriable => AttemptOutcome::TerminalFailure(
                SearchIndexError::retries_exhausted(attempt, response.status, snippet()),
            ),
            ResponseClass::Rejected => AttemptOutcome::TerminalFailure(
                SearchIndexError::bulk_rejected(response.status, snippet()),
            ),
        }
    }

    /// Deliver a batch, retrying transient failures.
    ///
    /// The identical body is resubmitted on every attempt.
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryReport)` - Item count reported by the engine and attempts used
    /// * `Err(SearchIndexError)` - On partial item errors, a non-retriable status,
    ///   an exhausted retry budget, or a transport failure
    #[instrument(skip(self, batch), fields(operations = batch.len()))]
    pub async fn deliver(&self, batch: &BulkBatch) -> Result<DeliveryReport, SearchIndexError> {
        if batch.is_empty() {
            debug!("Empty batch, nothing to deliver");
            return Ok(DeliveryReport {
                items: 0,
                attempts: 0,
            });
        }

        let body = batch.to_ndjson()?;
        let max_attempts = self.config.retry.max_attempts;

        for attempt in 1..=max_attempts {
            debug!(attempt = attempt, bytes = body.len(), "Sending bulk request");

            let response = self
                .transport
                .send(EngineRequest::post_ndjson(BULK_PATH, body.clone()))
                .await?;

            match self.evaluate_attempt(attempt, &response) {
                AttemptOutcome::Success { items } => {
                    info!(items = items, attempt = attempt, "Bulk request succeeded");
                    return Ok(DeliveryReport {
                        items,
                        attempts: attempt,
                    });
                }
                AttemptOutcome::RetryAfter(delay) => {
                    warn!(
                        status = response.status,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Bulk request not accepted, backing off"
                    );
                    sleep(delay).await;
                }
                AttemptOutcome::TerminalFailure(e) => {
                    error!(
                        status = response.status,
                        attempt = attempt,
                        error = %e,
                        "Bulk request failed"
                    );
                    return Err(e);
                }
            }
        }

        Err(SearchIndexError::unknown(format!(
            "Bulk delivery stopped after {} attempts without an outcome",
            max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use stream_indexer_shared::{BulkOperation, Document};
    use tokio::time::Instant;

    /// Mock transport replaying scripted responses.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<EngineResponse>>,
        sent: Mutex<Vec<(Instant, EngineRequest)>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<EngineResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SearchEngineTransport for ScriptedTransport {
        async fn send(&self, request: EngineRequest) -> Result<EngineResponse, SearchIndexError> {
            self.sent.lock().unwrap().push((Instant::now(), request));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| SearchIndexError::connection("no scripted response left"))
        }
    }

    fn batch() -> BulkBatch {
        vec![
            BulkOperation::index("saves", "u#1", 10, Document::default()),
            BulkOperation::delete("saves", "u#2"),
        ]
        .into_iter()
        .collect()
    }

    fn ok_body(items: usize) -> String {
        let items: Vec<Value> = (0..items)
            .map(|_| serde_json::json!({"index": {"status": 201}}))
            .collect();
        serde_json::json!({"took": 3, "errors": false, "items": items}).to_string()
    }

    #[test]
    fn test_classify_response() {
        assert_eq!(
            classify_response(200, &ok_body(2)),
            ResponseClass::Success { items: 2 }
        );
        assert_eq!(
            classify_response(200, r#"{"errors":true,"items":[]}"#),
            ResponseClass::PartialFailure
        );
        assert_eq!(classify_response(200, "<html>"), ResponseClass::Malformed);
        assert_eq!(classify_response(429, ""), ResponseClass::Retriable);
        assert_eq!(classify_response(500, ""), ResponseClass::Retriable);
        assert_eq!(classify_response(503, ""), ResponseClass::Retriable);
        assert_eq!(classify_response(400, ""), ResponseClass::Rejected);
        assert_eq!(classify_response(403, ""), ResponseClass::Rejected);
    }

    #[test]
    fn test_evaluate_attempt_schedule() {
        let engine = BulkDeliveryEngine::new(Arc::new(ScriptedTransport::new(vec![])));
        let busy = EngineResponse::new(503, "busy");

        for (attempt, secs) in [(1, 1), (2, 2), (3, 4)] {
            match engine.evaluate_attempt(attempt, &busy) {
                AttemptOutcome::RetryAfter(delay) => assert_eq!(delay, Duration::from_secs(secs)),
                other => panic!("expected retry, got {:?}", other),
            }
        }

        assert!(matches!(
            engine.evaluate_attempt(4, &busy),
            AttemptOutcome::TerminalFailure(SearchIndexError::RetriesExhausted {
                attempts: 4,
                status: 503,
                ..
            })
        ));
    }

    #[test]
    fn test_evaluate_attempt_truncates_snippet() {
        let engine = BulkDeliveryEngine::new(Arc::new(ScriptedTransport::new(vec![])));
        let response = EngineResponse::new(400, "e".repeat(1200));

        match engine.evaluate_attempt(1, &response) {
            AttemptOutcome::TerminalFailure(SearchIndexError::BulkRejected { status, snippet }) => {
                assert_eq!(status, 400);
                assert_eq!(snippet.len(), 500);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deliver_success_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![EngineResponse::new(
            200,
            ok_body(2),
        )]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let report = engine.deliver(&batch()).await.unwrap();
        assert_eq!(report, DeliveryReport { items: 2, attempts: 1 });

        let sent = transport.sent.lock().unwrap();
        let request = &sent[0].1;
        assert_eq!(request.path, BULK_PATH);
        assert_eq!(request.body.as_deref(), Some(batch().to_ndjson().unwrap().as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_retries_with_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            EngineResponse::new(503, "unavailable"),
            EngineResponse::new(429, "slow down"),
            EngineResponse::new(502, "bad gateway"),
            EngineResponse::new(200, ok_body(2)),
        ]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let report = engine.deliver(&batch()).await.unwrap();
        assert_eq!(report, DeliveryReport { items: 2, attempts: 4 });

        let sent = transport.sent.lock().unwrap();
        let gaps: Vec<Duration> = sent.windows(2).map(|w| w[1].0 - w[0].0).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert!(sent.iter().all(|(_, r)| r.body == sent[0].1.body));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_exhausts_attempts() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            EngineResponse::new(500, "boom"),
            EngineResponse::new(500, "boom"),
            EngineResponse::new(500, "boom"),
            EngineResponse::new(500, "boom"),
            EngineResponse::new(200, ok_body(2)),
        ]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let err = engine.deliver(&batch()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchIndexError::RetriesExhausted {
                attempts: 4,
                status: 500,
                ..
            }
        ));
        assert_eq!(transport.sent_count(), 4);
    }

    #[tokio::test]
    async fn test_deliver_partial_errors_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            EngineResponse::new(200, r#"{"errors":true,"items":[{"index":{"status":409}}]}"#),
            EngineResponse::new(200, ok_body(2)),
        ]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let err = engine.deliver(&batch()).await.unwrap_err();
        assert!(matches!(err, SearchIndexError::BulkPartialFailure { .. }));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_deliver_rejected_status_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![EngineResponse::new(
            403,
            "forbidden",
        )]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let err = engine.deliver(&batch()).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_deliver_transport_error_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let err = engine.deliver(&batch()).await.unwrap_err();
        assert!(matches!(err, SearchIndexError::ConnectionError(_)));
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_deliver_empty_batch_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let engine = BulkDeliveryEngine::new(transport.clone());

        let report = engine.deliver(&BulkBatch::new()).await.unwrap();
        assert_eq!(report.attempts, 0);
        assert_eq!(transport.sent_count(), 0);
    }
}
