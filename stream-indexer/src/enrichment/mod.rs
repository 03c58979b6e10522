//! Enrichment module for the stream indexer ingest.
//!
//! Derives semantic category tags for saves through an external
//! text-understanding service. Enrichment is best-effort: every failure is
//! reported as an outcome, never as an error, and the pipeline degrades to an
//! empty tag list.

mod openai;

pub use openai::{
    OpenAiConfig, OpenAiEnricher, DEFAULT_ENRICHMENT_TIMEOUT, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_OPENAI_MODEL,
};

use async_trait::async_trait;
use stream_indexer_shared::Document;
use thiserror::Error;

/// Maximum number of tags kept per document.
pub const MAX_ENRICHMENTS: usize = 5;

/// Fields of a document the enrichment service looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
}

impl EnrichmentInput {
    /// Collect the string fields the service needs from a document.
    pub fn from_document(document: &Document) -> Self {
        Self {
            title: document.title().map(str::to_string),
            description: document.description().map(str::to_string),
            url: document.url().map(str::to_string),
            image: document.image().map(str::to_string),
        }
    }
}

/// Result of asking the service for tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// The service answered; tags are cleaned and capped.
    Tags(Vec<String>),
    /// The call failed; carries the reason for logging.
    Failed(String),
}

impl EnrichmentOutcome {
    /// Build a successful outcome from raw service output.
    pub fn from_raw(raw: Vec<String>) -> Self {
        Self::Tags(clean_tags(raw))
    }

    /// Tags to index. A failed call yields no tags.
    pub fn into_tags(self) -> Vec<String> {
        match self {
            Self::Tags(tags) => tags,
            Self::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of asking the service whether a save is broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokenCheck {
    Broken,
    NotBroken,
    /// The call failed; the save is treated as not broken.
    Failed(String),
}

impl BrokenCheck {
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken)
    }
}

impl From<bool> for BrokenCheck {
    fn from(is_broken: bool) -> Self {
        if is_broken {
            Self::Broken
        } else {
            Self::NotBroken
        }
    }
}

/// Errors raised inside an enrichment call before they are folded into an
/// outcome.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("Response carried no output text")]
    MissingOutput,

    #[error("Output did not match the schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// Source of semantic tags for documents.
///
/// Implementations never fail: errors are folded into the returned outcome.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Whether this enricher talks to a service at all.
    ///
    /// When `false` the pipeline leaves the tag field untouched.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Request up to [`MAX_ENRICHMENTS`] category tags.
    async fn generate_enrichments(&self, input: &EnrichmentInput) -> EnrichmentOutcome;

    /// Ask whether the save is unusable for search or display.
    async fn detect_broken(&self, input: &EnrichmentInput) -> BrokenCheck;
}

/// Enricher used when no service credential is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEnricher;

#[async_trait]
impl Enricher for DisabledEnricher {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn generate_enrichments(&self, _input: &EnrichmentInput) -> EnrichmentOutcome {
        EnrichmentOutcome::Tags(Vec::new())
    }

    async fn detect_broken(&self, _input: &EnrichmentInput) -> BrokenCheck {
        BrokenCheck::NotBroken
    }
}

/// Trim tags, drop blanks and duplicates, and keep at most [`MAX_ENRICHMENTS`].
pub fn clean_tags(raw: Vec<String>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(MAX_ENRICHMENTS);
    for tag in raw {
        let tag = tag.trim();
        if tag.is_empty() || tags.iter().any(|kept| kept.eq_ignore_ascii_case(tag)) {
            continue;
        }
        tags.push(tag.to_string());
        if tags.len() == MAX_ENRICHMENTS {
            break;
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_tags_caps_and_dedupes() {
        let raw = vec![
            " restaurant ".to_string(),
            "".to_string(),
            "Restaurant".to_string(),
            "steakhouse".to_string(),
            "food".to_string(),
            "nyc".to_string(),
            "dining".to_string(),
            "nightlife".to_string(),
        ];
        assert_eq!(
            clean_tags(raw),
            vec!["restaurant", "steakhouse", "food", "nyc", "dining"]
        );
    }

    #[test]
    fn test_failed_outcome_degrades_to_empty() {
        let outcome = EnrichmentOutcome::Failed("timeout".to_string());
        assert!(outcome.is_failed());
        assert!(outcome.into_tags().is_empty());
    }

    #[test]
    fn test_input_from_document() {
        let document = Document::new(
            json!({
                "title": "Steak",
                "url": "https://example.com",
                "thirdPartyImage": "https://cdn.example.com/a.png",
                "description": 7
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        let input = EnrichmentInput::from_document(&document);
        assert_eq!(input.title.as_deref(), Some("Steak"));
        assert_eq!(input.description, None);
        assert_eq!(input.image.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn test_broken_check() {
        assert!(BrokenCheck::from(true).is_broken());
        assert!(!BrokenCheck::from(false).is_broken());
        assert!(!BrokenCheck::Failed("boom".to_string()).is_broken());
    }

    #[tokio::test]
    async fn test_disabled_enricher() {
        let enricher = DisabledEnricher;
        assert!(!enricher.is_enabled());
        let outcome = enricher
            .generate_enrichments(&EnrichmentInput::default())
            .await;
        assert_eq!(outcome, EnrichmentOutcome::Tags(Vec::new()));
    }
}
