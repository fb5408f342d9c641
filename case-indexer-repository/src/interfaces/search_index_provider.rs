//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, in-memory).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;
use case_indexer_shared::{DocId, IndexDocument};

/// Abstracts the underlying search index implementation.
///
/// Implementations are injected into `CaseIndexClient` to enable dependency
/// injection and testing without network access. Every operation is scoped
/// to a single document key, so concurrent callers need no coordination.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Name of the index this provider reads and writes.
    fn index_name(&self) -> &str;

    /// Fetch a document by primary key.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(source))` - The stored document source
    /// * `Ok(None)` - No document with this key exists
    /// * `Err(SearchIndexError)` - The lookup could not be performed
    async fn get_document(&self, doc_id: &DocId) -> Result<Option<Value>, SearchIndexError>;

    /// Insert documents by key and report the outcome per document.
    ///
    /// Writes are create-only: a doc_id that is already indexed is left
    /// untouched and reported as a failed item with
    /// [`SearchIndexError::DocumentExists`].
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document results
    /// * `Err(SearchIndexError)` - If the request fails entirely
    async fn upsert_documents(
        &self,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Whether the index exists.
    async fn index_exists(&self) -> Result<bool, SearchIndexError>;

    /// Create the index with its settings and mappings.
    async fn create_index(&self) -> Result<(), SearchIndexError>;
}
