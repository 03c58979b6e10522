//! Dependency initialization and wiring for the stream indexer.

use std::sync::Arc;
use tracing::{info, warn};

use super::IndexerConfig;
use crate::enrichment::{DisabledEnricher, Enricher, OpenAiEnricher};
use crate::loader::{IndexRouting, SearchLoader};
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::processor::EntityProcessor;
use crate::IndexingError;
use stream_indexer_repository::{OpenSearchTransport, RequestSigner, UnsignedRequests};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configuration everything below was built from.
    pub config: IndexerConfig,
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// Requests are sent unsigned; hosts that hold signing credentials use
    /// [`Dependencies::with_signer`] instead.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the configuration is invalid
    pub async fn new() -> Result<Self, IndexingError> {
        let config = IndexerConfig::from_env()?;
        Self::with_signer(config, Arc::new(UnsignedRequests))
    }

    /// Wire the components for a configuration and signing capability.
    pub fn with_signer(
        config: IndexerConfig,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, IndexingError> {
        info!(
            endpoint = %config.endpoint,
            primary_index = %config.indices.primary_index,
            tag_index = %config.indices.tag_index,
            region = ?config.region,
            signing_service = %config.signing_service,
            enrichment_enabled = config.enrichment.is_some(),
            detect_broken = config.detect_broken,
            "Initializing dependencies"
        );

        let transport = OpenSearchTransport::new(
            &config.endpoint,
            signer,
            &config.signing_service,
            config.region.clone(),
        )
        .map_err(|e| IndexingError::config(format!("Failed to create search transport: {}", e)))?;

        let enricher: Arc<dyn Enricher> = match &config.enrichment {
            Some(openai) => Arc::new(OpenAiEnricher::new(openai.clone()).map_err(|e| {
                IndexingError::config(format!("Failed to create enrichment client: {}", e))
            })?),
            None => {
                warn!("OPENAI_API_KEY not set, enrichment disabled");
                Arc::new(DisabledEnricher)
            }
        };

        let loader = SearchLoader::from_transport(
            Arc::new(transport),
            IndexRouting::new(config.indices.clone()),
        );

        let orchestrator = Orchestrator::with_config(
            EntityProcessor::new(),
            enricher,
            loader,
            OrchestratorConfig {
                detect_broken: config.detect_broken,
            },
        );

        Ok(Self {
            config,
            orchestrator,
        })
    }
}
