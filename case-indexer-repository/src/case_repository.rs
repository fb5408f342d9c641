//! Case storage on top of a [`DocumentStore`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::errors::{CaseRepositoryError, StorageError};
use crate::interfaces::DocumentStore;
use case_indexer_shared::paths::{
    case_document_key, evidence_key, evidence_prefix, is_case_document_key,
};
use case_indexer_shared::CaseDocument;

/// An attachment as listed from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceFile {
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Reads and writes case documents and their attachments.
#[derive(Clone)]
pub struct CaseRepository {
    store: Arc<dyn DocumentStore>,
}

impl CaseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Whether a case document exists for `case_id`.
    pub async fn case_exists(&self, case_id: &str) -> Result<bool, CaseRepositoryError> {
        Ok(self.store.exists(&case_document_key(case_id)).await?)
    }

    /// Load and validate the case document of `case_id`.
    pub async fn load_case(&self, case_id: &str) -> Result<CaseDocument, CaseRepositoryError> {
        match self.load_case_at(&case_document_key(case_id)).await {
            Err(CaseRepositoryError::Storage(StorageError::NotFound(_))) => {
                Err(CaseRepositoryError::CaseNotFound(case_id.to_string()))
            }
            other => other,
        }
    }

    /// Load and validate the case document stored at `key`.
    pub async fn load_case_at(&self, key: &str) -> Result<CaseDocument, CaseRepositoryError> {
        let bytes = self.store.read(key).await?;
        Ok(CaseDocument::from_slice(&bytes)?)
    }

    /// Create a fresh open case. Refuses to overwrite an existing one.
    #[instrument(skip(self, opening_date))]
    pub async fn create_case(
        &self,
        case_number: &str,
        opening_date: Option<String>,
    ) -> Result<CaseDocument, CaseRepositoryError> {
        let key = case_document_key(case_number);
        if self.store.exists(&key).await? {
            return Err(CaseRepositoryError::CaseAlreadyExists(case_number.to_string()));
        }

        let document = CaseDocument::new_open(case_number, opening_date, Utc::now());
        document.validate()?;
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| CaseRepositoryError::Model(e.into()))?;

        match self
            .store
            .write_if_absent(&key, &bytes, Some("application/json"))
            .await
        {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => {
                return Err(CaseRepositoryError::CaseAlreadyExists(case_number.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        info!(case_id = %case_number, "Created case");
        Ok(document)
    }

    /// Store an attachment under the case's evidence folder.
    #[instrument(skip(self, bytes, content_type), fields(size = bytes.len()))]
    pub async fn add_evidence(
        &self,
        case_id: &str,
        filename: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<(), CaseRepositoryError> {
        validate_filename(filename)?;

        match self
            .store
            .write_if_absent(&evidence_key(case_id, filename), bytes, content_type)
            .await
        {
            Ok(()) => {
                debug!("Stored evidence");
                Ok(())
            }
            Err(StorageError::AlreadyExists(_)) => Err(CaseRepositoryError::EvidenceAlreadyExists {
                case_id: case_id.to_string(),
                filename: filename.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Read an attachment.
    pub async fn get_evidence(
        &self,
        case_id: &str,
        filename: &str,
    ) -> Result<Vec<u8>, CaseRepositoryError> {
        validate_filename(filename)?;
        Ok(self.store.read(&evidence_key(case_id, filename)).await?)
    }

    /// List the attachments of a case.
    pub async fn list_evidence(&self, case_id: &str) -> Result<Vec<EvidenceFile>, CaseRepositoryError> {
        let prefix = evidence_prefix(case_id);
        let objects = self.store.list(&prefix).await?;

        Ok(objects
            .into_iter()
            .filter_map(|object| {
                let filename = object.name.strip_prefix(&prefix)?.to_string();
                Some(EvidenceFile {
                    filename,
                    size_bytes: object.size,
                    content_type: object.content_type,
                    uploaded_at: object.modified_at,
                })
            })
            .collect())
    }

    /// Keys of every case document under `prefix`.
    pub async fn list_case_paths(&self, prefix: &str) -> Result<Vec<String>, CaseRepositoryError> {
        let objects = self.store.list(prefix).await?;
        Ok(objects
            .into_iter()
            .map(|object| object.name)
            .filter(|name| is_case_document_key(name))
            .collect())
    }
}

fn validate_filename(filename: &str) -> Result<(), CaseRepositoryError> {
    let valid = !filename.trim().is_empty()
        && !filename.contains(&['/', '\\'][..])
        && filename != "."
        && filename != "..";

    if valid {
        Ok(())
    } else {
        Err(CaseRepositoryError::InvalidFilename(filename.to_string()))
    }
}
