//! In-memory backends for tests and local dry runs.
//!
//! Both backends keep their state behind `tokio::sync::RwLock` and count
//! calls with atomics so tests can assert on the number of round trips.

mod index;
mod store;

pub use index::InMemorySearchIndex;
pub use store::InMemoryDocumentStore;
