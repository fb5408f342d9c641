//! Versioned document identifiers.
//!
//! Every index document is keyed by `{case_id}__{index_version_tag}`. The tag
//! is the index name itself, so a schema change (which requires a new index
//! name) also produces new document ids.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// The only index name this build writes to.
///
/// Changing the index schema requires a new name (e.g. `case_index_v4`).
pub const CASE_INDEX_NAME: &str = "case_index_v3";

/// Separator between the case id and the index version tag.
pub const DOC_ID_SEPARATOR: &str = "__";

/// Primary key of an index document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Derive the doc id for a case in the current index version.
    ///
    /// The result is validated; a case id that cannot produce a well-formed
    /// doc id (empty, or containing a line break) is rejected.
    pub fn derive(case_id: &str) -> Result<Self, ModelError> {
        Self::parse(format!("{case_id}{DOC_ID_SEPARATOR}{CASE_INDEX_NAME}"))
    }

    /// Validate an existing doc id string.
    pub fn parse(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Check `value` against `^.+__{CASE_INDEX_NAME}$`.
    pub fn validate(value: &str) -> Result<(), ModelError> {
        let suffix = format!("{DOC_ID_SEPARATOR}{CASE_INDEX_NAME}");
        match value.strip_suffix(suffix.as_str()) {
            Some(prefix) if !prefix.is_empty() && !prefix.contains(&['\n', '\r'][..]) => Ok(()),
            _ => Err(ModelError::InvalidDocId(value.to_string())),
        }
    }

    /// The case id portion of the doc id.
    pub fn case_id(&self) -> &str {
        let suffix_len = DOC_ID_SEPARATOR.len() + CASE_INDEX_NAME.len();
        &self.0[..self.0.len() - suffix_len]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}
