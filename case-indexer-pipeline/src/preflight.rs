//! Checks run once before a batch.
//!
//! Configuration-level problems surface here and abort the run before any
//! case is touched.

use tracing::{info, instrument};

use crate::embedding::{check_dimensions, EmbeddingProvider};
use crate::errors::IngestError;
use case_indexer_repository::CaseIndexClient;
use case_indexer_shared::CASE_INDEX_NAME;

/// Text embedded to probe the embedding deployment.
pub const PROBE_TEXT: &str = "ping";

/// Verify index identity, index presence and the embedding dimension.
#[instrument(skip(index, embedder), fields(index = %index.index_name(), embedder = %embedder.name()))]
pub async fn run_preflight(
    index: &CaseIndexClient,
    embedder: &dyn EmbeddingProvider,
    expected_dimensions: usize,
) -> Result<(), IngestError> {
    if index.index_name() != CASE_INDEX_NAME {
        return Err(IngestError::configuration(format!(
            "Refusing to use index '{}', expected '{}'",
            index.index_name(),
            CASE_INDEX_NAME
        )));
    }

    let exists = index
        .index_exists()
        .await
        .map_err(|e| IngestError::configuration(format!("Index check failed: {}", e)))?;
    if !exists {
        return Err(IngestError::configuration(format!(
            "Index '{}' does not exist; run `ensure-index` first",
            CASE_INDEX_NAME
        )));
    }

    let probe = embedder.embed(PROBE_TEXT).await?;
    check_dimensions(&probe, expected_dimensions)?;

    info!(dimensions = probe.len(), "Preflight checks passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use async_trait::async_trait;
    use case_indexer_repository::InMemorySearchIndex;
    use std::sync::Arc;

    struct FixedEmbedder(usize);

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.5; self.0])
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        fn name(&self) -> &str {
            "down"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Request("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_preflight_passes() {
        let index = CaseIndexClient::new(Arc::new(InMemorySearchIndex::new()));
        run_preflight(&index, &FixedEmbedder(8), 8).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_index_is_configuration_error() {
        let index = CaseIndexClient::new(Arc::new(InMemorySearchIndex::missing()));
        let err = run_preflight(&index, &FixedEmbedder(8), 8).await.unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let index = CaseIndexClient::new(Arc::new(InMemorySearchIndex::new()));
        let err = run_preflight(&index, &FixedEmbedder(4), 8).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreachable_embedder() {
        let index = CaseIndexClient::new(Arc::new(InMemorySearchIndex::new()));
        let err = run_preflight(&index, &DownEmbedder, 8).await.unwrap_err();
        assert_eq!(err.reason_code().as_str(), "embedding_failed");
    }
}
