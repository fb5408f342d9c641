//! # Case Indexer Pipeline
//!
//! This crate ingests closed incident cases into the case search index.
//!
//! ## Architecture
//!
//! Each case flows through the same fixed sequence:
//!
//! 1. **Projection**: derive the flat searchable view of the case
//! 2. **Change detection**: fingerprint the projection and compare it with the indexed one
//! 3. **Embedding**: turn the projection text into a vector
//! 4. **Assembly**: build the index document
//! 5. **Orchestrator**: run the sequence per case and record one outcome per case
//!
//! The embedding call is only made for cases that are new to the index, so an
//! unchanged re-run costs one index lookup per case.

pub mod assembler;
pub mod change;
pub mod embedding;
pub mod errors;
pub mod orchestrator;
pub mod preflight;
pub mod projection;

pub use embedding::{AzureOpenAiConfig, AzureOpenAiEmbedder, EmbeddingError, EmbeddingProvider};
pub use errors::{IngestError, ReasonCode};
pub use orchestrator::{
    BatchReport, IngestOutcome, IngestionOrchestrator, OrchestratorConfig, OutcomeStatus,
};
pub use preflight::run_preflight;
