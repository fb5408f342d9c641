//! Index document model.

use serde::{Deserialize, Serialize};

use crate::case::null_as_default;
use crate::doc_id::DocId;
use crate::projection::SearchableProjection;

/// A record stored in the case search index.
///
/// Identity, metadata and organizational facets come from the case document;
/// the projection fields are flattened into the top level; `content_vector`
/// is the embedding of the projection text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub doc_id: DocId,
    pub case_id: String,
    pub status: String,
    #[serde(default)]
    pub opening_date: Option<String>,
    #[serde(default)]
    pub closure_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default = "default_version")]
    pub version: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization_country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization_site: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization_department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discipline_completed: Vec<String>,
    #[serde(flatten)]
    pub projection: SearchableProjection,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_vector: Vec<f32>,
}

fn default_version() -> i64 {
    1
}
