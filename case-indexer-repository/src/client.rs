//! Case index client implementation.
//!
//! This module provides the main client for interacting with the case search
//! index. Application code uses it to look documents up by key, upsert them,
//! and make sure the index exists.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::SearchIndexConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::BatchOperationSummary;
use case_indexer_shared::{DocId, IndexDocument};

/// The main client for interacting with the case search index.
///
/// Every document key is validated before the provider is called, so a
/// malformed doc_id never causes a network round trip.
#[derive(Clone)]
pub struct CaseIndexClient {
    provider: Arc<dyn SearchIndexProvider>,
    config: SearchIndexConfig,
}

impl CaseIndexClient {
    /// Create a new CaseIndexClient with default configuration.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self {
            provider,
            config: SearchIndexConfig::default(),
        }
    }

    /// Create a new CaseIndexClient with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: SearchIndexConfig) -> Self {
        Self { provider, config }
    }

    /// Name of the underlying index.
    pub fn index_name(&self) -> &str {
        self.provider.index_name()
    }

    /// Check if batch size exceeds the configured limit.
    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        if let Some(max) = self.config.max_batch_size {
            if size > max {
                return Err(SearchIndexError::batch_size_exceeded(size, max));
            }
        }
        Ok(())
    }

    /// Fetch a document source by primary key.
    /// Input: doc_id string; must match `{case_id}__{index_version_tag}`
    /// Output: Ok(None) when the document does not exist
    pub async fn get_by_key(&self, doc_id: &str) -> Result<Option<Value>, SearchIndexError> {
        let doc_id = DocId::parse(doc_id).map_err(|e| SearchIndexError::validation(e.to_string()))?;
        self.provider.get_document(&doc_id).await
    }

    /// Insert documents by key. Already indexed doc_ids are never replaced.
    /// Input: documents with valid doc_ids and non-empty case_ids
    /// Output: per-document results
    ///
    /// The batch size is limited by the configured max_batch_size (default: 1000).
    pub async fn upsert(
        &self,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        self.validate_batch_size(documents.len())?;

        for document in documents {
            DocId::validate(document.doc_id.as_str())
                .map_err(|e| SearchIndexError::validation(e.to_string()))?;
            if document.case_id.trim().is_empty() {
                return Err(SearchIndexError::validation(
                    "All documents must have case_id",
                ));
            }
        }

        self.provider.upsert_documents(documents).await
    }

    /// Whether the index exists.
    pub async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        self.provider.index_exists().await
    }

    /// Create the index if it does not exist.
    /// Output: true when the index was created by this call
    pub async fn ensure_index(&self) -> Result<bool, SearchIndexError> {
        if self.provider.index_exists().await? {
            info!(index = %self.index_name(), "Index already exists");
            return Ok(false);
        }

        self.provider.create_index().await?;
        info!(index = %self.index_name(), "Index created");
        Ok(true)
    }
}
