//! Interface definitions for the external collaborators of the indexer.
//!
//! The document store and the search index are consumed through these traits
//! so that backends can be swapped (OpenSearch, filesystem, in-memory fakes).

mod document_store;
mod search_index_provider;

pub use document_store::{guess_content_type, validate_key, DocumentStore};
pub use search_index_provider::SearchIndexProvider;
