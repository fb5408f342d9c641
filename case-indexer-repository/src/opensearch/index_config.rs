//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the case search index.
//! The field schema is tied to the index name: changing it requires a new name.

use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;
use case_indexer_shared::{SearchableProjection, CASE_INDEX_NAME};

/// Name of the HNSW method used for `content_vector`.
pub const VECTOR_METHOD: &str = "hnsw";

/// Index identity and vector shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Index name. Always [`CASE_INDEX_NAME`].
    pub name: String,
    /// Length of `content_vector`.
    pub vector_dimensions: usize,
}

impl IndexConfig {
    /// Create a config for `name`, refusing any name other than the canonical one.
    pub fn new(name: &str, vector_dimensions: usize) -> Result<Self, SearchIndexError> {
        if name != CASE_INDEX_NAME {
            return Err(SearchIndexError::index_name_not_allowed(name, CASE_INDEX_NAME));
        }
        if vector_dimensions == 0 {
            return Err(SearchIndexError::validation(
                "vector dimensions must be greater than zero",
            ));
        }

        Ok(Self {
            name: name.to_string(),
            vector_dimensions,
        })
    }

    /// Config for the canonical index.
    pub fn canonical(vector_dimensions: usize) -> Result<Self, SearchIndexError> {
        Self::new(CASE_INDEX_NAME, vector_dimensions)
    }

    /// Get the index settings and mappings for the case search index.
    ///
    /// The configuration includes:
    /// - **keyword** identity and facet fields for filtering and sorting
    /// - **date** fields in RFC 3339 UTC
    /// - **text** fields for every projection text field
    /// - **knn_vector** `content_vector` of the configured dimension
    pub fn settings(&self) -> Value {
        let mut properties = Map::new();

        for field in ["doc_id", "case_id", "status"] {
            properties.insert(field.to_string(), json!({ "type": "keyword" }));
        }
        for field in ["opening_date", "closure_date", "created_at", "updated_at"] {
            properties.insert(field.to_string(), json!({ "type": "date" }));
        }
        properties.insert("version".to_string(), json!({ "type": "integer" }));
        for field in [
            "organization_country",
            "organization_site",
            "organization_department",
            "discipline_completed",
        ] {
            properties.insert(field.to_string(), json!({ "type": "keyword" }));
        }

        // List-valued projection fields are searchable but not faceted.
        for field in SearchableProjection::FIELD_NAMES {
            properties.insert(field.to_string(), json!({ "type": "text" }));
        }

        properties.insert(
            "content_vector".to_string(),
            json!({
                "type": "knn_vector",
                "dimension": self.vector_dimensions,
                "method": {
                    "name": VECTOR_METHOD,
                    "space_type": "cosinesimil",
                    "engine": "lucene"
                }
            }),
        );

        json!({
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 1,
                "index": {
                    "knn": true
                }
            },
            "mappings": {
                "dynamic": "strict",
                "properties": properties
            }
        })
    }
}
