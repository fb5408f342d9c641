//! Case repository error types.

use case_indexer_shared::ModelError;
use thiserror::Error;

use super::StorageError;

/// Errors raised by [`CaseRepository`](crate::CaseRepository).
#[derive(Debug, Clone, Error)]
pub enum CaseRepositoryError {
    /// A case with this number already exists.
    #[error("Case already exists: {0}")]
    CaseAlreadyExists(String),

    /// No case with this number exists.
    #[error("Case not found: {0}")]
    CaseNotFound(String),

    /// An attachment with this file name already exists for the case.
    #[error("Evidence '{filename}' already exists for case {case_id}")]
    EvidenceAlreadyExists { case_id: String, filename: String },

    /// The attachment file name cannot be used as a storage key segment.
    #[error("Invalid evidence filename: {0}")]
    InvalidFilename(String),

    /// The stored document is not a valid case.
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
