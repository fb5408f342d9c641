//! Filesystem [`DocumentStore`].
//!
//! Keys map to paths relative to a root directory. Content types are not
//! persisted; listings infer them from the file extension.
//!
//! Objects are written to a staging file in the target directory and moved
//! into place without replacing an existing file, so a key is either absent
//! or holds the complete bytes.

use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, instrument};

use crate::errors::StorageError;
use crate::interfaces::{guess_content_type, validate_key, DocumentStore};
use crate::types::StoredObject;

/// Document store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }

    /// Directory to start a listing from: the deepest directory fully named by `prefix`.
    fn listing_root(&self, prefix: &str) -> PathBuf {
        match prefix.rsplit_once('/') {
            Some((dir, _)) if validate_key(dir).is_ok() => {
                dir.split('/').fold(self.root.clone(), |path, segment| path.join(segment))
            }
            _ => self.root.clone(),
        }
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
        Some(segments?.join("/"))
    }
}

/// File name prefix of in-progress writes. Never listed.
const STAGING_PREFIX: &str = ".staging-";

/// Create `path` with the content written by `fill`.
///
/// The content goes to a staging file first, which is removed if `fill` or
/// the final move fails. The move fails with `AlreadyExists` if `path` exists.
fn write_new_file<F>(path: &Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "path has no parent directory"))?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)?;
    fill(staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

fn backend_error(key: &str, err: io::Error) -> StorageError {
    match err.kind() {
        ErrorKind::NotFound => StorageError::not_found(key),
        ErrorKind::AlreadyExists => StorageError::already_exists(key),
        _ => StorageError::backend(key, err.to_string()),
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(backend_error(key, e)),
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| backend_error(key, e))
    }

    /// The declared content type is not stored; [`DocumentStore::list`]
    /// reports the type matching the file extension.
    #[instrument(skip(self, bytes, _content_type), fields(size = bytes.len()))]
    async fn write_if_absent(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| backend_error(key, e))?;
        }

        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || write_new_file(&path, |file| file.write_all(&bytes)))
            .await
            .map_err(|e| StorageError::backend(key, e.to_string()))?
            .map_err(|e| backend_error(key, e))?;

        debug!("Wrote object");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>, StorageError> {
        let mut objects = Vec::new();
        let mut pending = vec![self.listing_root(prefix)];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(backend_error(prefix, e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| backend_error(prefix, e))?
            {
                let path = entry.path();
                let metadata = entry.metadata().await.map_err(|e| backend_error(prefix, e))?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                objects.push(StoredObject {
                    content_type: Some(guess_content_type(&key).to_string()),
                    size: metadata.len(),
                    modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
                    name: key,
                });
            }
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store
            .write_if_absent("INC-1/case.json", b"{\"a\":1}", Some("application/json"))
            .await
            .unwrap();

        assert!(store.exists("INC-1/case.json").await.unwrap());
        assert_eq!(store.read("INC-1/case.json").await.unwrap(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_write_if_absent_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store.write_if_absent("INC-1/case.json", b"1", None).await.unwrap();
        let err = store
            .write_if_absent("INC-1/case.json", b"2", None)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.read("INC-1/case.json").await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let case_dir = dir.path().join("INC-1");
        std::fs::create_dir_all(&case_dir).unwrap();
        let target = case_dir.join("case.json");

        let err = write_new_file(&target, |file| {
            file.write_all(b"{\"case\": {\"case_num")?;
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(&case_dir).unwrap().count(), 0);

        // A retry is not blocked by the failed attempt.
        store
            .write_if_absent("INC-1/case.json", b"{}", None)
            .await
            .unwrap();
        assert_eq!(store.read("INC-1/case.json").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_refused_overwrite_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store.write_if_absent("INC-1/case.json", b"1", None).await.unwrap();
        assert!(store.write_if_absent("INC-1/case.json", b"2", None).await.is_err());

        let names: Vec<String> = std::fs::read_dir(dir.path().join("INC-1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["case.json"]);
    }

    #[tokio::test]
    async fn test_listed_content_type_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store
            .write_if_absent("INC-1/evidence/scan.pdf", b"%PDF", Some("image/png"))
            .await
            .unwrap();
        std::fs::write(dir.path().join("INC-1/evidence/.staging-abc"), b"partial").unwrap();

        let listed = store.list("INC-1/evidence/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "INC-1/evidence/scan.pdf");
        assert_eq!(listed[0].content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_missing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        assert!(!store.exists("INC-1/case.json").await.unwrap());
        assert!(matches!(
            store.read("INC-1/case.json").await.unwrap_err(),
            StorageError::NotFound(_)
        ));
        assert!(store.list("INC-1/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_recurses_and_filters_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        store.write_if_absent("INC-1/case.json", b"{}", None).await.unwrap();
        store
            .write_if_absent("INC-1/evidence/photo.png", b"png", None)
            .await
            .unwrap();
        store.write_if_absent("INC-2/case.json", b"{}", None).await.unwrap();

        let all: Vec<String> = store
            .list("")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(
            all,
            vec!["INC-1/case.json", "INC-1/evidence/photo.png", "INC-2/case.json"]
        );

        let evidence = store.list("INC-1/evidence/").await.unwrap();
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].size, 3);
        assert_eq!(evidence[0].content_type.as_deref(), Some("image/png"));
        assert!(evidence[0].modified_at.is_some());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());

        let err = store.read("../secret").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
