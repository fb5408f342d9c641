//! # Case Indexer Repository
//!
//! This crate provides the seams to the external collaborators of the
//! closed-case indexer:
//!
//! - [`DocumentStore`]: case documents and attachments (filesystem and in-memory backends)
//! - [`CaseRepository`]: case-level operations on top of a document store
//! - [`SearchIndexProvider`]: the search index (OpenSearch and in-memory backends)
//! - [`CaseIndexClient`]: validating client over a search index provider

pub mod case_repository;
pub mod client;
pub mod config;
pub mod errors;
pub mod filesystem;
pub mod interfaces;
pub mod memory;
pub mod opensearch;
pub mod types;

pub use case_repository::{CaseRepository, EvidenceFile};
pub use client::CaseIndexClient;
pub use config::SearchIndexConfig;
pub use errors::{CaseRepositoryError, SearchIndexError, StorageError};
pub use filesystem::FsDocumentStore;
pub use interfaces::{DocumentStore, SearchIndexProvider};
pub use memory::{InMemoryDocumentStore, InMemorySearchIndex};
pub use opensearch::{BasicAuth, IndexConfig, OpenSearchClient};
pub use types::{BatchOperationResult, BatchOperationSummary, StoredObject};
