//! Embedding adapter.
//!
//! Defines the [`EmbeddingProvider`] trait the pipeline consumes and the
//! Azure OpenAI REST implementation. The pipeline owns the adapter contract
//! and the dimension check, not the model.
//!
//! # Retry Strategy
//!
//! The Azure OpenAI provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (other) → fail immediately
//! - Network errors and timeouts → retry

mod azure_openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::IngestError;

pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiEmbedder, DEFAULT_API_VERSION};

/// Errors raised by embedding providers.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Required settings are missing or invalid.
    #[error("Embedding configuration error: {0}")]
    Configuration(String),

    /// The request could not be sent or timed out.
    #[error("Embedding request failed: {0}")]
    Request(String),

    /// The service answered with an error status.
    #[error("Embedding API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response does not contain a numeric embedding.
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

impl EmbeddingError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<EmbeddingError> for IngestError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Configuration(msg) => IngestError::Configuration(msg),
            other => IngestError::EmbeddingUnavailable(other.to_string()),
        }
    }
}

/// Turns text into a fixed-length vector.
///
/// Implementations own their timeouts and retries; a returned error means
/// the text could not be embedded.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Human-readable identifier of the model or deployment.
    fn name(&self) -> &str;

    /// Embed one non-empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Check a vector against the configured index dimension.
pub fn check_dimensions(vector: &[f32], expected: usize) -> Result<(), IngestError> {
    if vector.len() != expected {
        return Err(IngestError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Render a secret for logs as `****` plus its last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
