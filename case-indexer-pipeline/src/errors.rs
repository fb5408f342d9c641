//! Error types for the ingestion pipeline.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Machine-readable reason attached to SKIPPED and FAILED outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    SchemaValidationError,
    StatusNotClosed,
    InvalidDocId,
    IndexLookupFailed,
    ContentHashUnchanged,
    ContentHashChangedForClosedCase,
    EmptyEmbeddingInput,
    EmbeddingFailed,
    EmbeddingDimensionMismatch,
    DocumentShapeInvalid,
    IndexUpsertFailed,
    DuplicateCaseId,
    ConfigurationError,
    CaseListingFailed,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::SchemaValidationError => "schema_validation_error",
            ReasonCode::StatusNotClosed => "status_not_closed",
            ReasonCode::InvalidDocId => "invalid_doc_id",
            ReasonCode::IndexLookupFailed => "index_lookup_failed",
            ReasonCode::ContentHashUnchanged => "content_hash_unchanged",
            ReasonCode::ContentHashChangedForClosedCase => "content_hash_changed_for_closed_case",
            ReasonCode::EmptyEmbeddingInput => "empty_embedding_input",
            ReasonCode::EmbeddingFailed => "embedding_failed",
            ReasonCode::EmbeddingDimensionMismatch => "embedding_dimension_mismatch",
            ReasonCode::DocumentShapeInvalid => "document_shape_invalid",
            ReasonCode::IndexUpsertFailed => "index_upsert_failed",
            ReasonCode::DuplicateCaseId => "duplicate_case_id",
            ReasonCode::ConfigurationError => "configuration_error",
            ReasonCode::CaseListingFailed => "case_listing_failed",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReasonCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Errors that can occur while ingesting cases.
///
/// Per-case errors are converted to outcomes at the orchestrator boundary.
/// Fatal errors (see [`IngestError::is_fatal`]) abort the whole run.
#[derive(Error, Debug, Clone)]
pub enum IngestError {
    /// The source document is unreadable or does not match the case schema.
    #[error("Schema validation failed: {0}")]
    SchemaInvalid(String),

    /// The case is not closed.
    #[error("Case is not closed (status: {status})")]
    NotEligible { status: String },

    /// The derived doc_id does not match the versioned key pattern.
    #[error("Invalid doc_id: {0}")]
    InvalidDocId(String),

    /// The index could not be queried for the current document.
    #[error("Index lookup failed: {0}")]
    IndexLookupFailed(String),

    /// A closed case's projection changed after it was indexed.
    #[error("Content of closed case changed since indexing (doc_id: {doc_id})")]
    ContentDrift { doc_id: String },

    /// The projection holds no text to embed.
    #[error("Embedding input is empty")]
    EmptyEmbeddingInput,

    /// The embedding adapter failed or returned a malformed response.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The embedding length differs from the configured index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A field does not have the shape the index schema requires.
    #[error("Invalid shape for field '{field}': {reason}")]
    DocumentShapeInvalid { field: String, reason: String },

    /// The index rejected the upsert, or the document is not retrievable afterwards.
    #[error("Index write failed: {0}")]
    IndexWriteFailed(String),

    /// Another key in the same batch already holds this case id.
    #[error("Case {case_id} is also stored at '{first_key}'")]
    DuplicateCase { case_id: String, first_key: String },

    /// Invalid or missing configuration detected before processing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The candidate cases could not be listed.
    #[error("Failed to list cases: {0}")]
    CaseListingFailed(String),
}

impl IngestError {
    /// Create a schema validation error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaInvalid(msg.into())
    }

    /// Create an index lookup error.
    pub fn index_lookup(msg: impl Into<String>) -> Self {
        Self::IndexLookupFailed(msg.into())
    }

    /// Create an embedding error.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    /// Create a document shape error.
    pub fn shape(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DocumentShapeInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an index write error.
    pub fn index_write(msg: impl Into<String>) -> Self {
        Self::IndexWriteFailed(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The reason code reported for this error.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            Self::SchemaInvalid(_) => ReasonCode::SchemaValidationError,
            Self::NotEligible { .. } => ReasonCode::StatusNotClosed,
            Self::InvalidDocId(_) => ReasonCode::InvalidDocId,
            Self::IndexLookupFailed(_) => ReasonCode::IndexLookupFailed,
            Self::ContentDrift { .. } => ReasonCode::ContentHashChangedForClosedCase,
            Self::EmptyEmbeddingInput => ReasonCode::EmptyEmbeddingInput,
            Self::EmbeddingUnavailable(_) => ReasonCode::EmbeddingFailed,
            Self::DimensionMismatch { .. } => ReasonCode::EmbeddingDimensionMismatch,
            Self::DocumentShapeInvalid { .. } => ReasonCode::DocumentShapeInvalid,
            Self::IndexWriteFailed(_) => ReasonCode::IndexUpsertFailed,
            Self::DuplicateCase { .. } => ReasonCode::DuplicateCaseId,
            Self::Configuration(_) => ReasonCode::ConfigurationError,
            Self::CaseListingFailed(_) => ReasonCode::CaseListingFailed,
        }
    }

    /// Whether the error halts the whole run instead of a single case.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. } | Self::Configuration(_) | Self::CaseListingFailed(_)
        )
    }
}
