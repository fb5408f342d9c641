//! Error types for the case indexer repository.

mod case_repository_error;
mod search_index_error;
mod storage_error;

pub use case_repository_error::CaseRepositoryError;
pub use search_index_error::SearchIndexError;
pub use storage_error::StorageError;
