//! Enrichment through the OpenAI Responses API.
//!
//! Both calls use strict JSON-schema structured output, so the reply text
//! must deserialize into exactly the expected shape or the call counts as
//! failed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use serde_json::{json, Value};
use stream_indexer_repository::truncate_snippet;
use tracing::{debug, instrument, warn};

use super::{
    BrokenCheck, EnrichmentError, EnrichmentInput, EnrichmentOutcome, Enricher, MAX_ENRICHMENTS,
};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(10);

const ERROR_SNIPPET_CHARS: usize = 200;
const MISSING_FIELD: &str = "(none)";

/// Connection settings for the OpenAI client.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create a config with the default model, endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }
}

// Keeps the key out of logs.
impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Production enricher backed by the OpenAI Responses API.
///
/// # Example
///
/// ```ignore
/// use stream_indexer::enrichment::{Enricher, OpenAiConfig, OpenAiEnricher};
///
/// let enricher = OpenAiEnricher::new(OpenAiConfig::new(api_key))?;
/// let tags = enricher.generate_enrichments(&input).await.into_tags();
/// ```
pub struct OpenAiEnricher {
    client: ReqwestClient,
    config: OpenAiConfig,
}

impl OpenAiEnricher {
    /// Build a client whose every request is bounded by the configured timeout.
    pub fn new(config: OpenAiConfig) -> Result<Self, EnrichmentError> {
        let client = ReqwestClient::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Send one structured-output request and return the reply text.
    async fn request_structured(
        &self,
        prompt: String,
        schema_name: &str,
        schema: Value,
    ) -> Result<String, EnrichmentError> {
        let body = request_body(&self.config.model, prompt, schema_name, schema);

        let response = self
            .client
            .post(self.config.responses_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                snippet: truncate_snippet(&text, ERROR_SNIPPET_CHARS),
            });
        }

        let reply: ResponsesReply = serde_json::from_str(&text)?;
        reply.output_text().ok_or(EnrichmentError::MissingOutput)
    }
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    #[instrument(skip(self, input), fields(model = %self.config.model))]
    async fn generate_enrichments(&self, input: &EnrichmentInput) -> EnrichmentOutcome {
        let result = self
            .request_structured(
                enrichment_prompt(input),
                "enrichment_schema",
                enrichment_schema(),
            )
            .await
            .and_then(|text| parse_enrichments(&text));

        match result {
            Ok(tags) => {
                debug!(tag_count = tags.len(), "Received enrichments");
                EnrichmentOutcome::from_raw(tags)
            }
            Err(e) => {
                warn!(error = %e, "Enrichment request failed");
                EnrichmentOutcome::Failed(e.to_string())
            }
        }
    }

    #[instrument(skip(self, input), fields(model = %self.config.model))]
    async fn detect_broken(&self, input: &EnrichmentInput) -> BrokenCheck {
        let result = self
            .request_structured(broken_prompt(input), "broken_schema", broken_schema())
            .await
            .and_then(|text| parse_broken(&text));

        match result {
            Ok(is_broken) => BrokenCheck::from(is_broken),
            Err(e) => {
                warn!(error = %e, "Broken-save check failed");
                BrokenCheck::Failed(e.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnrichmentPayload {
    enrichments: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BrokenPayload {
    #[serde(rename = "isBroken")]
    is_broken: bool,
}

/// The parts of a Responses API reply that carry the model's text.
#[derive(Debug, Default, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesReply {
    /// The aggregated `output_text`, else the first `output_text` content item.
    fn output_text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Some(text);
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .find(|content| content.kind == "output_text")
            .and_then(|content| content.text)
    }
}

fn request_body(model: &str, prompt: String, schema_name: &str, schema: Value) -> Value {
    json!({
        "model": model,
        "input": prompt,
        "text": {
            "format": {
                "type": "json_schema",
                "strict": true,
                "name": schema_name,
                "schema": schema,
            }
        }
    })
}

fn enrichment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "enrichments": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["enrichments"],
        "additionalProperties": false
    })
}

fn broken_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "isBroken": { "type": "boolean" }
        },
        "required": ["isBroken"],
        "additionalProperties": false
    })
}

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING_FIELD)
}

fn enrichment_prompt(input: &EnrichmentInput) -> String {
    format!(
        "Title: {}\n\
         Description: {}\n\
         URL: {}\n\n\
         Return a JSON object with a single field \"enrichments\": a list of semantic categories \
         the content belongs to that will be used for search enhancements.\n\
         There should be a maximum of {} enrichments strings. Exclude overly generic categories \
         like \"Social Media\".\n\
         If nothing of value can be inferred, return an empty array.\n\
         No explanations.",
        field(&input.title),
        field(&input.description),
        field(&input.url),
        MAX_ENRICHMENTS,
    )
}

fn broken_prompt(input: &EnrichmentInput) -> String {
    format!(
        "Title: {}\n\
         Description: {}\n\
         URL: {}\n\
         Image: {}\n\n\
         Determine if this save is \"broken\": e.g. missing or invalid URL, no usable title, \
         no image when one would be expected, or content that cannot be meaningfully used for \
         search or display. That could include login blockers or paywalls, or a title or \
         description that indicates the fetch was rate-limited.\n\
         Return a JSON object with a single boolean field \"isBroken\": true if broken, false otherwise.\n\
         No explanations.",
        field(&input.title),
        field(&input.description),
        field(&input.url),
        field(&input.image),
    )
}

fn parse_enrichments(text: &str) -> Result<Vec<String>, EnrichmentError> {
    let payload: EnrichmentPayload = serde_json::from_str(text)?;
    Ok(payload.enrichments)
}

fn parse_broken(text: &str) -> Result<bool, EnrichmentError> {
    let payload: BrokenPayload = serde_json::from_str(text)?;
    Ok(payload.is_broken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> EnrichmentInput {
        EnrichmentInput {
            title: Some("Peter Luger".to_string()),
            description: Some("  ".to_string()),
            url: Some("https://peterluger.com".to_string()),
            image: None,
        }
    }

    #[test]
    fn test_request_body_uses_strict_schema() {
        let body = request_body(
            DEFAULT_OPENAI_MODEL,
            "prompt".to_string(),
            "enrichment_schema",
            enrichment_schema(),
        );

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["input"], "prompt");
        let format = &body["text"]["format"];
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["strict"], true);
        assert_eq!(format["name"], "enrichment_schema");
        assert_eq!(format["schema"]["required"], json!(["enrichments"]));
        assert_eq!(format["schema"]["additionalProperties"], false);
    }

    #[test]
    fn test_prompts_fill_missing_fields() {
        let prompt = enrichment_prompt(&input());
        assert!(prompt.starts_with("Title: Peter Luger\nDescription: (none)\nURL: https://peterluger.com"));
        assert!(prompt.contains("maximum of 5"));

        let prompt = broken_prompt(&input());
        assert!(prompt.contains("Image: (none)"));
    }

    #[test]
    fn test_output_text_prefers_aggregate() {
        let reply: ResponsesReply = serde_json::from_value(json!({
            "output_text": "{\"enrichments\":[\"a\"]}",
            "output": []
        }))
        .unwrap();
        assert_eq!(reply.output_text().as_deref(), Some("{\"enrichments\":[\"a\"]}"));
    }

    #[test]
    fn test_output_text_from_content_items() {
        let reply: ResponsesReply = serde_json::from_value(json!({
            "id": "resp_1",
            "output": [
                {"type": "reasoning", "content": []},
                {
                    "type": "message",
                    "content": [
                        {"type": "refusal", "refusal": "no"},
                        {"type": "output_text", "text": "{\"isBroken\":true}"}
                    ]
                }
            ]
        }))
        .unwrap();
        assert_eq!(reply.output_text().as_deref(), Some("{\"isBroken\":true}"));

        let empty: ResponsesReply = serde_json::from_value(json!({"output": []})).unwrap();
        assert!(empty.output_text().is_none());
    }

    #[test]
    fn test_payloads_must_match_exactly() {
        assert_eq!(
            parse_enrichments(r#"{"enrichments":["restaurant","steakhouse"]}"#).unwrap(),
            vec!["restaurant", "steakhouse"]
        );
        assert!(parse_enrichments(r#"{"enrichments":["a"],"extra":1}"#).is_err());
        assert!(parse_enrichments(r#"{"tags":["a"]}"#).is_err());
        assert!(parse_enrichments("not json").is_err());

        assert!(parse_broken(r#"{"isBroken":true}"#).unwrap());
        assert!(parse_broken(r#"{"isBroken":"yes"}"#).is_err());
    }

    #[test]
    fn test_responses_url() {
        let config = OpenAiConfig::new("key").with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.responses_url(), "http://localhost:8080/v1/responses");
        assert!(!format!("{:?}", config).contains("api_key"));
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades() {
        let config = OpenAiConfig::new("key")
            .with_base_url("http://127.0.0.1:9/v1")
            .with_timeout(Duration::from_millis(500));
        let enricher = OpenAiEnricher::new(config).unwrap();

        let outcome = enricher.generate_enrichments(&input()).await;
        assert!(outcome.is_failed());
        assert!(outcome.into_tags().is_empty());

        let check = enricher.detect_broken(&input()).await;
        assert!(!check.is_broken());
    }
}
