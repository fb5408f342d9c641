//! Change detector.
//!
//! A projection is fingerprinted by hashing its canonical serialization
//! (keys sorted, compact, exact text) with SHA-256. The fingerprint of the
//! indexed document is recomputed from the projection fields stored in the
//! index, so no extra hash field is needed in the index schema.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::errors::IngestError;
use case_indexer_repository::CaseIndexClient;
use case_indexer_shared::{ContentFingerprint, DocId, SearchableProjection};

/// Outcome of comparing a fresh fingerprint with the indexed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeDecision {
    /// Nothing indexed yet: embed and insert.
    New,
    /// Indexed content is identical: skip.
    Unchanged,
    /// Indexed content differs: closed-case immutability violated.
    Drifted {
        existing: ContentFingerprint,
        new: ContentFingerprint,
    },
}

/// Compare fingerprints.
pub fn decide(existing: Option<&ContentFingerprint>, new: &ContentFingerprint) -> ChangeDecision {
    match existing {
        None => ChangeDecision::New,
        Some(existing) if existing == new => ChangeDecision::Unchanged,
        Some(existing) => ChangeDecision::Drifted {
            existing: existing.clone(),
            new: new.clone(),
        },
    }
}

/// Fingerprint a projection.
pub fn fingerprint(projection: &SearchableProjection) -> ContentFingerprint {
    // Serializing a plain struct of strings cannot fail.
    let value = serde_json::to_value(projection).unwrap_or(Value::Null);
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    ContentFingerprint::from_hex(format!("{:x}", hasher.finalize()))
}

/// Compact JSON with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Looks up the fingerprint of the currently indexed version of a case.
#[derive(Clone)]
pub struct ChangeDetector {
    index: CaseIndexClient,
}

impl ChangeDetector {
    pub fn new(index: CaseIndexClient) -> Self {
        Self { index }
    }

    /// Fingerprint of the indexed document, or `None` if it is not indexed yet.
    #[instrument(skip(self), fields(doc_id = %doc_id))]
    pub async fn lookup_existing_fingerprint(
        &self,
        doc_id: &DocId,
    ) -> Result<Option<ContentFingerprint>, IngestError> {
        let Some(source) = self
            .index
            .get_by_key(doc_id.as_str())
            .await
            .map_err(|e| IngestError::index_lookup(e.to_string()))?
        else {
            debug!("Document not indexed yet");
            return Ok(None);
        };

        let projection: SearchableProjection = serde_json::from_value(source).map_err(|e| {
            IngestError::index_lookup(format!("stored document has unexpected shape: {}", e))
        })?;

        Ok(Some(fingerprint(&projection)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn projection() -> SearchableProjection {
        SearchableProjection {
            problem_description: "Leak".to_string(),
            team_members: vec!["Ana".to_string()],
            evidence_descriptions: "Photo".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(&projection());
        let b = fingerprint(&projection());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let mut edited = projection();
        edited.evidence_descriptions = "Photo (edited)".to_string();
        assert_ne!(fingerprint(&projection()), fingerprint(&edited));
    }

    #[test]
    fn test_fingerprint_is_exact_text() {
        let mut padded = projection();
        padded.problem_description = "Leak ".to_string();
        assert_ne!(fingerprint(&projection()), fingerprint(&padded));
    }

    #[test]
    fn test_canonical_sorts_keys() {
        let mut out = String::new();
        write_canonical(&json!({"b": [1, {"z": null, "a": "x"}], "a": true}), &mut out);
        assert_eq!(out, r#"{"a":true,"b":[1,{"a":"x","z":null}]}"#);
    }

    #[test]
    fn test_fingerprint_survives_index_roundtrip() {
        let original = projection();
        let mut stored = serde_json::to_value(&original).unwrap();
        stored["doc_id"] = json!("INC-1__case_index_v3");
        stored["content_vector"] = json!([0.1, 0.2]);

        let restored: SearchableProjection = serde_json::from_value(stored).unwrap();
        assert_eq!(fingerprint(&restored), fingerprint(&original));
    }

    #[test]
    fn test_decide() {
        let a = ContentFingerprint::from_hex("aa");
        let b = ContentFingerprint::from_hex("bb");

        assert_eq!(decide(None, &a), ChangeDecision::New);
        assert_eq!(decide(Some(&a), &a), ChangeDecision::Unchanged);
        assert_eq!(
            decide(Some(&a), &b),
            ChangeDecision::Drifted {
                existing: a.clone(),
                new: b.clone()
            }
        );
    }
}
