//! Request and response types for document store and search index operations.

use chrono::{DateTime, Utc};

use crate::errors::SearchIndexError;

/// Metadata of an object returned by a document store listing.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Full key of the object.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type recorded at write time, or guessed from the extension.
    pub content_type: Option<String>,
    /// Last modification time, when the backend tracks it.
    pub modified_at: Option<DateTime<Utc>>,
}

/// Result of a batch operation for a single document.
///
/// This struct represents the outcome of a single operation within a batch. It
/// indicates whether the operation succeeded and includes error details if it
/// failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document's primary key.
    pub doc_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

impl BatchOperationResult {
    pub fn succeeded(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(doc_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            doc_id: doc_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// Allows callers to handle partial failures: a failed document does not
/// invalidate the others in the same request.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Result for a specific document, if it was part of the batch.
    pub fn result_for(&self, doc_id: &str) -> Option<&BatchOperationResult> {
        self.results.iter().find(|r| r.doc_id == doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_results() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult::succeeded("A__case_index_v3"),
            BatchOperationResult::failed("B__case_index_v3", SearchIndexError::index("mapping")),
        ]);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.result_for("A__case_index_v3").unwrap().success);
        assert!(summary.result_for("C__case_index_v3").is_none());
    }
}
