//! OpenSearch implementation of the search index provider.

mod client;
mod index_config;

pub use client::{BasicAuth, OpenSearchClient};
pub use index_config::IndexConfig;
