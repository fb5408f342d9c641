//! Search index error types.
//!
//! This module defines the error types that can occur during search index operations.

use thiserror::Error;

/// Errors that can occur during search index operations.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., malformed doc_id) raised before any network call.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to index a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// A document with this doc_id is already indexed and is never replaced.
    #[error("Document already exists: {0}")]
    DocumentExists(String),

    /// A read by key failed for a reason other than absence.
    #[error("Lookup error: {0}")]
    LookupError(String),

    /// Bulk operation had failures or could not be executed.
    #[error("Bulk operation error: {0}")]
    BulkOperationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// The configured index name is not the one this build writes to.
    #[error("Index name '{provided}' is not allowed, expected '{expected}'")]
    IndexNameNotAllowed { provided: String, expected: String },

    /// Failed to create the index or read its state.
    #[error("Index management error: {0}")]
    IndexManagementError(String),

    /// Failed to parse a response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a document exists error.
    pub fn document_exists(doc_id: impl Into<String>) -> Self {
        Self::DocumentExists(doc_id.into())
    }

    /// Create a lookup error.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::LookupError(msg.into())
    }

    /// Create a bulk operation error.
    pub fn bulk_operation(msg: impl Into<String>) -> Self {
        Self::BulkOperationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create an index name error.
    pub fn index_name_not_allowed(provided: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::IndexNameNotAllowed {
            provided: provided.into(),
            expected: expected.into(),
        }
    }

    /// Create an index management error.
    pub fn index_management(msg: impl Into<String>) -> Self {
        Self::IndexManagementError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
