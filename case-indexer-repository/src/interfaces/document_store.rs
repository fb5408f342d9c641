//! Document store trait definition.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::types::StoredObject;

/// Addressable storage of case documents and binary attachments.
///
/// Keys are `/`-separated relative paths such as `INC-1/case.json`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Read the object at `key`.
    ///
    /// Returns `StorageError::NotFound` when nothing is stored there.
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write an object, refusing to overwrite.
    ///
    /// A failed write leaves the key absent. `content_type` is a hint that
    /// backends may store or derive from the key instead.
    /// Returns `StorageError::AlreadyExists` when the key is taken.
    async fn write_if_absent(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), StorageError>;

    /// List every object whose key starts with `prefix`, sorted by key.
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError>;
}

/// Reject keys that are empty, absolute, or contain empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StorageError::invalid_key(key))
    }
}

/// Content type inferred from a key's extension.
pub fn guess_content_type(key: &str) -> &'static str {
    let extension = key
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("txt") | Some("log") => "text/plain",
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("INC-1/case.json").is_ok());
        assert!(validate_key("cases/INC-1/evidence/photo.png").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("INC-1/../INC-2/case.json").is_err());
        assert!(validate_key("INC-1//case.json").is_err());
        assert!(validate_key("INC-1\\case.json").is_err());
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("INC-1/case.json"), "application/json");
        assert_eq!(guess_content_type("INC-1/evidence/Photo.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("INC-1/evidence/blob"), "application/octet-stream");
    }
}
