//! Document assembler.
//!
//! Combines identity, metadata, organizational facets, completed disciplines,
//! the projection and the embedding into one [`IndexDocument`]. Shape checks
//! run before the embedding call so a case that can never be written does
//! not cost an embedding.

use serde_json::Value;

use crate::errors::IngestError;
use crate::projection::text::scalar_text;
use case_indexer_shared::case::Organization;
use case_indexer_shared::{dates, CaseDocument, DocId, IndexDocument, SearchableProjection};

/// Verify that list-typed and facet fields can be mapped to the index schema.
pub fn check_shape(case: &CaseDocument) -> Result<(), IngestError> {
    scalar_list("team_members", &case.phases.d1_d2.data.team_members)?;
    for item in &case.evidence {
        scalar_list("evidence_tags", &item.tags)?;
    }
    completed_disciplines(case)?;
    organization_facets(&case.phases.d1_d2.data.organization)?;
    Ok(())
}

/// Assemble the index document.
pub fn assemble(
    case: &CaseDocument,
    doc_id: DocId,
    projection: SearchableProjection,
    content_vector: Vec<f32>,
) -> Result<IndexDocument, IngestError> {
    if content_vector.is_empty() {
        return Err(IngestError::shape("content_vector", "vector is empty"));
    }
    if let Some(i) = content_vector.iter().position(|v| !v.is_finite()) {
        return Err(IngestError::shape(
            "content_vector",
            format!("component {} is not finite", i),
        ));
    }

    let [organization_country, organization_site, organization_department] =
        organization_facets(&case.phases.d1_d2.data.organization)?;

    Ok(IndexDocument {
        doc_id,
        case_id: case.case_id().to_string(),
        status: case.status().as_str().to_string(),
        opening_date: date_field("opening_date", Some(&case.identity.opening_date))?,
        closure_date: date_field("closure_date", case.closure_date())?,
        created_at: date_field("created_at", Some(&case.meta.created_at))?,
        updated_at: date_field("updated_at", case.meta.updated_at.as_deref())?,
        version: case.meta.version,
        organization_country,
        organization_site,
        organization_department,
        discipline_completed: completed_disciplines(case)?,
        projection,
        content_vector,
    })
}

fn date_field(field: &str, value: Option<&str>) -> Result<Option<String>, IngestError> {
    dates::normalize(field, value).map_err(|e| IngestError::schema(e.to_string()))
}

fn organization_facets(org: &Organization) -> Result<[String; 3], IngestError> {
    Ok([
        scalar_field("organization_country", &org.country)?,
        scalar_field("organization_site", &org.site)?,
        scalar_field("organization_department", &org.department)?,
    ])
}

/// Text for a keyword field. Lists of scalars are newline-joined; objects are rejected.
fn scalar_field(field: &str, value: &Value) -> Result<String, IngestError> {
    match value {
        Value::Object(_) => Err(IngestError::shape(field, "expected text, found an object")),
        Value::Array(_) => {
            scalar_list(field, value)?;
            Ok(scalar_text(value))
        }
        other => Ok(scalar_text(other)),
    }
}

/// Ensure a value is a scalar or a flat list of scalars.
fn scalar_list(field: &str, value: &Value) -> Result<(), IngestError> {
    match value {
        Value::Object(_) => Err(IngestError::shape(field, "expected a list, found an object")),
        Value::Array(items) => match items.iter().position(|v| v.is_object() || v.is_array()) {
            Some(i) => Err(IngestError::shape(
                field,
                format!("entry {} is not a scalar", i),
            )),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Disciplines of all completed phases, in phase order.
///
/// A completed phase contributes the disciplines declared in its header, or
/// the disciplines it covers by definition when none are declared.
fn completed_disciplines(case: &CaseDocument) -> Result<Vec<String>, IngestError> {
    let mut out = Vec::new();

    for (key, header) in case.phases.headers() {
        if !header.completed {
            continue;
        }

        match &header.discipline {
            Value::Null => out.extend(key.disciplines().iter().map(|d| d.to_string())),
            Value::String(s) if s.trim().is_empty() => {
                out.extend(key.disciplines().iter().map(|d| d.to_string()))
            }
            Value::Array(items) => {
                scalar_list("discipline_completed", &header.discipline)?;
                out.extend(
                    items
                        .iter()
                        .map(scalar_text)
                        .filter(|d| !d.trim().is_empty()),
                );
            }
            Value::Object(_) => {
                return Err(IngestError::shape(
                    "discipline_completed",
                    format!("discipline of phase {} is an object", key.as_str()),
                ))
            }
            scalar => out.push(scalar_text(scalar)),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::build_projection;
    use serde_json::json;

    fn case_json() -> Value {
        json!({
            "case": {
                "case_number": "INC-20260122-0001",
                "opening_date": "2026-01-22T08:00:00",
                "status": "closed"
            },
            "evidence": [{"filename": "a.jpg", "description": "Photo", "tags": ["leak"]}],
            "phases": {
                "D1_D2": {"header": {"completed": true}, "data": {
                    "problem_description": "Oil leak",
                    "team_members": ["Ana"],
                    "organization": {"country": "ES", "site": "Madrid", "department": null}
                }},
                "D3": {"header": {"completed": true, "discipline": "D3"}, "data": {}},
                "D4": {"header": {"completed": true, "discipline": ["D4", null]}, "data": {}},
                "D5": {"header": {"completed": false, "discipline": "D5"}, "data": {}},
                "D8": {"header": {"completed": true}, "data": {"closure_date": "2026-02-01"}}
            },
            "meta": {"version": 3, "created_at": "2026-01-22T08:00:00", "updated_at": "2026-02-01T10:30:00+02:00"}
        })
    }

    fn case_from(value: Value) -> CaseDocument {
        serde_json::from_value(value).unwrap()
    }

    fn assemble_case(case: &CaseDocument) -> Result<IndexDocument, IngestError> {
        assemble(
            case,
            DocId::derive(case.case_id()).unwrap(),
            build_projection(case),
            vec![0.1, 0.2, 0.3],
        )
    }

    #[test]
    fn test_assemble() {
        let case = case_from(case_json());
        check_shape(&case).unwrap();
        let doc = assemble_case(&case).unwrap();

        assert_eq!(doc.doc_id.as_str(), "INC-20260122-0001__case_index_v3");
        assert_eq!(doc.case_id, "INC-20260122-0001");
        assert_eq!(doc.status, "closed");
        assert_eq!(doc.opening_date.as_deref(), Some("2026-01-22T08:00:00Z"));
        assert_eq!(doc.closure_date.as_deref(), Some("2026-02-01T00:00:00Z"));
        assert_eq!(doc.updated_at.as_deref(), Some("2026-02-01T08:30:00Z"));
        assert_eq!(doc.version, 3);
        assert_eq!(doc.organization_country, "ES");
        assert_eq!(doc.organization_site, "Madrid");
        assert_eq!(doc.organization_department, "");
        assert_eq!(doc.discipline_completed, vec!["D1", "D2", "D3", "D4", "D8"]);
        assert_eq!(doc.projection.problem_description, "Oil leak");
        assert_eq!(doc.content_vector, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_nested_team_members_are_rejected() {
        let mut value = case_json();
        value["phases"]["D1_D2"]["data"]["team_members"] = json!([{"name": "Ana"}]);
        let case = case_from(value);

        let err = check_shape(&case).unwrap_err();
        assert!(matches!(
            err,
            IngestError::DocumentShapeInvalid { ref field, .. } if field == "team_members"
        ));
    }

    #[test]
    fn test_object_tags_are_rejected() {
        let mut value = case_json();
        value["evidence"][0]["tags"] = json!({"kind": "photo"});
        let case = case_from(value);

        assert!(check_shape(&case).is_err());
    }

    #[test]
    fn test_object_facet_is_rejected() {
        let mut value = case_json();
        value["phases"]["D1_D2"]["data"]["organization"]["site"] = json!({"name": "Madrid"});
        let case = case_from(value);

        assert!(check_shape(&case).is_err());
        assert!(assemble_case(&case).is_err());
    }

    #[test]
    fn test_empty_or_non_finite_vector_is_rejected() {
        let case = case_from(case_json());
        let doc_id = DocId::derive(case.case_id()).unwrap();

        let err = assemble(&case, doc_id.clone(), build_projection(&case), vec![]).unwrap_err();
        assert_eq!(err.reason_code().as_str(), "document_shape_invalid");

        let err = assemble(&case, doc_id, build_projection(&case), vec![0.1, f32::NAN]).unwrap_err();
        assert_eq!(err.reason_code().as_str(), "document_shape_invalid");
    }

    #[test]
    fn test_closure_date_from_identity_wins() {
        let mut value = case_json();
        value["case"]["closure_date"] = json!("2026-01-30T12:00:00Z");
        let doc = assemble_case(&case_from(value)).unwrap();

        assert_eq!(doc.closure_date.as_deref(), Some("2026-01-30T12:00:00Z"));
    }
}
