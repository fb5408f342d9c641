//! Document store error types.

use thiserror::Error;

/// Errors that can occur while reading or writing the document store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No object exists at the key.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// An object already exists at the key and overwriting was not allowed.
    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    /// The key is empty, absolute, or escapes the store root.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The backend failed.
    #[error("Storage backend error for '{key}': {message}")]
    Backend { key: String, message: String },
}

impl StorageError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create an already exists error.
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists(key.into())
    }

    /// Create an invalid key error.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }

    /// Create a backend error.
    pub fn backend(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            key: key.into(),
            message: message.into(),
        }
    }
}
