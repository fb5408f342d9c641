//! Model error types.
//!
//! Errors raised while parsing or validating case documents, storage keys and
//! document identifiers.

use thiserror::Error;

/// Errors that can occur while reading or validating model data.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The case document is not valid JSON or does not match the case schema.
    #[error("Malformed case document: {0}")]
    Malformed(String),

    /// A required value is present but empty.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A date field could not be interpreted as an ISO-8601 timestamp.
    #[error("Invalid date in {field}: {value}")]
    InvalidDate { field: String, value: String },

    /// A document id does not match `{case_id}__{index_version_tag}`.
    #[error("Invalid doc_id '{0}'")]
    InvalidDocId(String),

    /// A storage key does not have the `{case_id}/case.json` shape.
    #[error("Invalid case path: {0}")]
    InvalidCasePath(String),
}

impl ModelError {
    /// Create a malformed document error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Create an invalid date error.
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}
