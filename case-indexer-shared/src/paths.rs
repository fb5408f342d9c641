//! Storage key layout.
//!
//! Case documents live at `{case_id}/case.json`, attachments at
//! `{case_id}/evidence/{filename}`. Keys may carry a leading prefix
//! (e.g. `cases/`), so the case id is always the segment immediately before
//! `case.json`.

use crate::errors::ModelError;

/// File name of the case document inside a case folder.
pub const CASE_DOCUMENT_NAME: &str = "case.json";

/// Folder name of case attachments.
pub const EVIDENCE_FOLDER: &str = "evidence";

/// Key of the case document for `case_id`.
pub fn case_document_key(case_id: &str) -> String {
    format!("{case_id}/{CASE_DOCUMENT_NAME}")
}

/// Prefix under which all attachments of `case_id` are stored.
pub fn evidence_prefix(case_id: &str) -> String {
    format!("{case_id}/{EVIDENCE_FOLDER}/")
}

/// Key of a single attachment.
pub fn evidence_key(case_id: &str, filename: &str) -> String {
    format!("{}{filename}", evidence_prefix(case_id))
}

/// Whether a key names a case document.
pub fn is_case_document_key(key: &str) -> bool {
    key.ends_with(&format!("/{CASE_DOCUMENT_NAME}"))
        && !key.contains(&format!("/{EVIDENCE_FOLDER}/"))
}

/// Extract the case id from a case document key.
pub fn case_id_from_key(key: &str) -> Result<&str, ModelError> {
    let mut segments = key.rsplit('/');
    let file = segments.next();
    let case_id = segments.next();

    match (file, case_id) {
        (Some(CASE_DOCUMENT_NAME), Some(id)) if !id.trim().is_empty() => Ok(id),
        _ => Err(ModelError::InvalidCasePath(key.to_string())),
    }
}
