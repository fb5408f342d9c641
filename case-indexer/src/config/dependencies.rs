//! Dependency initialization and wiring for the case indexer.

use std::sync::Arc;

use tracing::info;

use crate::config::{IndexSettings, IndexerConfig};
use crate::IndexingError;
use case_indexer_pipeline::{
    AzureOpenAiEmbedder, EmbeddingProvider, IngestionOrchestrator,
};
use case_indexer_repository::{
    CaseIndexClient, CaseRepository, FsDocumentStore, IndexConfig, OpenSearchClient,
};

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub config: IndexerConfig,
    /// Client of the case index, shared with the orchestrator.
    pub index: CaseIndexClient,
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// The configured orchestrator ready to run.
    pub orchestrator: IngestionOrchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`IndexerConfig::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If configuration is missing or invalid
    pub async fn new() -> Result<Self, IndexingError> {
        let config = IndexerConfig::from_env()?;
        Self::from_config(config).await
    }

    /// Wire dependencies from an already loaded config.
    pub async fn from_config(config: IndexerConfig) -> Result<Self, IndexingError> {
        config.log_summary();

        let index = connect_index(&config.index).await?;

        let store = FsDocumentStore::new(&config.store_root);
        info!(root = %store.root().display(), "Using filesystem document store");
        let repository = CaseRepository::new(Arc::new(store));

        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(AzureOpenAiEmbedder::new(config.embedding.clone())?);

        let orchestrator = IngestionOrchestrator::with_config(
            repository,
            index.clone(),
            embedder.clone(),
            config.orchestrator_config(),
        );

        Ok(Self {
            config,
            index,
            embedder,
            orchestrator,
        })
    }
}

/// Client of the case index built from the index settings alone.
///
/// Used by commands that only manage the index, so they run without the
/// document store or embedding settings.
pub async fn connect_index(settings: &IndexSettings) -> Result<CaseIndexClient, IndexingError> {
    let index_config = IndexConfig::canonical(settings.vector_dimensions)?;
    let search_client = OpenSearchClient::new(
        &settings.opensearch_url,
        index_config,
        settings.opensearch_auth.clone(),
    )
    .await
    .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

    Ok(CaseIndexClient::new(Arc::new(search_client)))
}
