//! Searchable projection and content fingerprint types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::case::null_as_default;

/// Flat, search-oriented view of a case.
///
/// Field order is the order in which text is concatenated for the embedding
/// input. The same fields are stored verbatim in the index document, so the
/// projection of an indexed case can be read back from the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchableProjection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub problem_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team_members: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub what_happened: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub why_problem: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub when: String,
    #[serde(default, rename = "where", deserialize_with = "null_as_default")]
    pub where_: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub who: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub how_identified: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub immediate_actions_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permanent_actions_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub investigation_tasks_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub factors_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishbone_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub five_whys_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence_descriptions: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ai_summary: String,
}

/// One projection field, borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionValue<'a> {
    Text(&'a str),
    List(&'a [String]),
}

impl SearchableProjection {
    /// Field names in projection order.
    pub const FIELD_NAMES: [&'static str; 18] = [
        "problem_description",
        "team_members",
        "what_happened",
        "why_problem",
        "when",
        "where",
        "who",
        "how_identified",
        "impact",
        "immediate_actions_text",
        "permanent_actions_text",
        "investigation_tasks_text",
        "factors_text",
        "fishbone_text",
        "five_whys_text",
        "evidence_descriptions",
        "evidence_tags",
        "ai_summary",
    ];

    /// All fields with their names, in projection order.
    pub fn fields(&self) -> [(&'static str, ProjectionValue<'_>); 18] {
        use ProjectionValue::{List, Text};
        [
            ("problem_description", Text(&self.problem_description)),
            ("team_members", List(&self.team_members)),
            ("what_happened", Text(&self.what_happened)),
            ("why_problem", Text(&self.why_problem)),
            ("when", Text(&self.when)),
            ("where", Text(&self.where_)),
            ("who", Text(&self.who)),
            ("how_identified", Text(&self.how_identified)),
            ("impact", Text(&self.impact)),
            ("immediate_actions_text", Text(&self.immediate_actions_text)),
            ("permanent_actions_text", Text(&self.permanent_actions_text)),
            ("investigation_tasks_text", Text(&self.investigation_tasks_text)),
            ("factors_text", Text(&self.factors_text)),
            ("fishbone_text", Text(&self.fishbone_text)),
            ("five_whys_text", Text(&self.five_whys_text)),
            ("evidence_descriptions", Text(&self.evidence_descriptions)),
            ("evidence_tags", List(&self.evidence_tags)),
            ("ai_summary", Text(&self.ai_summary)),
        ]
    }

    /// Whether every field is blank.
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|(_, value)| match value {
            ProjectionValue::Text(text) => text.trim().is_empty(),
            ProjectionValue::List(items) => items.iter().all(|i| i.trim().is_empty()),
        })
    }
}

/// Hex-encoded SHA-256 digest of a canonical projection serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Wrap an already computed hex digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_match_serialization() {
        let value = serde_json::to_value(SearchableProjection::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), SearchableProjection::FIELD_NAMES.len());
        for name in SearchableProjection::FIELD_NAMES {
            assert!(object.contains_key(name), "missing {name}");
        }

        let projection = SearchableProjection::default();
        let names: Vec<&str> = projection.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, SearchableProjection::FIELD_NAMES);
    }

    #[test]
    fn test_deserialize_tolerates_nulls_and_extra_fields() {
        let projection: SearchableProjection = serde_json::from_value(json!({
            "problem_description": "Leak",
            "team_members": null,
            "where": "Line 4",
            "content_vector": [0.1, 0.2],
            "doc_id": "A__case_index_v3"
        }))
        .unwrap();

        assert_eq!(projection.problem_description, "Leak");
        assert_eq!(projection.where_, "Line 4");
        assert!(projection.team_members.is_empty());
        assert_eq!(projection.ai_summary, "");
    }

    #[test]
    fn test_is_blank() {
        let mut projection = SearchableProjection::default();
        assert!(projection.is_blank());

        projection.evidence_tags = vec!["  ".to_string()];
        assert!(projection.is_blank());

        projection.ai_summary = "summary".to_string();
        assert!(!projection.is_blank());
    }
}
