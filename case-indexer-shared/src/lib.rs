//! # Case Indexer Shared
//!
//! Types shared by every crate of the closed-case indexer:
//!
//! - [`CaseDocument`]: the nested incident record as stored in the document store
//! - [`SearchableProjection`]: the flat, search-oriented view derived from a case
//! - [`ContentFingerprint`]: content hash of a projection
//! - [`IndexDocument`]: the record written to the search index
//! - [`DocId`]: the versioned primary key of an index document

pub mod case;
pub mod dates;
pub mod doc_id;
pub mod document;
pub mod errors;
pub mod paths;
pub mod projection;

pub use case::{CaseDocument, CaseStatus, EvidenceItem, PhaseHeader, PhaseKey};
pub use doc_id::{DocId, CASE_INDEX_NAME, DOC_ID_SEPARATOR};
pub use document::IndexDocument;
pub use errors::ModelError;
pub use projection::{ContentFingerprint, ProjectionValue, SearchableProjection};
