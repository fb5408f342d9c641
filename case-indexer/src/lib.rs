//! # Case Indexer
//!
//! Main library for the closed-case search indexer.
//!
//! This crate provides the configuration, logging setup and dependency
//! wiring for running the ingestion pipeline from the command line.

pub mod config;
pub mod logging;

pub use config::{connect_index, Dependencies, IndexSettings, IndexerConfig};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingestion error that halted the run.
    #[error("Ingestion error: {0}")]
    IngestError(#[from] case_indexer_pipeline::IngestError),

    /// Search index error.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] case_indexer_repository::SearchIndexError),

    /// Embedding setup error.
    #[error("Embedding error: {0}")]
    EmbeddingError(#[from] case_indexer_pipeline::EmbeddingError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error stems from configuration rather than a runtime fault.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::ConfigError(_) | Self::EmbeddingError(_) => true,
            Self::IngestError(e) => e.is_fatal(),
            Self::SearchIndexError(_) => false,
        }
    }
}
