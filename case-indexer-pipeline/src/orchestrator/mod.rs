//! Ingestion orchestrator.
//!
//! Drives each case through load, eligibility, doc_id derivation, projection,
//! change decision, embedding, assembly and upsert, in that order, and
//! records exactly one outcome per case. Per-case errors become outcomes;
//! fatal errors halt the batch.

mod outcome;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::assembler::{assemble, check_shape};
use crate::change::{decide, fingerprint, ChangeDecision, ChangeDetector};
use crate::embedding::{check_dimensions, EmbeddingProvider};
use crate::errors::{IngestError, ReasonCode};
use crate::projection::{build_projection, embedding_input};
use case_indexer_repository::{CaseIndexClient, CaseRepository};
use case_indexer_shared::paths::{case_document_key, case_id_from_key};
use case_indexer_shared::DocId;

pub use outcome::{log_outcome, BatchReport, IngestOutcome, OutcomeStatus, OUTCOME_TARGET};

/// Default number of cases processed concurrently in batch mode.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default embedding dimension of the case index.
pub const DEFAULT_VECTOR_DIMENSIONS: usize = 3072;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Key prefix under which case folders live.
    pub prefix: String,
    /// Expected embedding length.
    pub vector_dimensions: usize,
    /// Number of cases processed concurrently in batch mode.
    pub concurrency: usize,
    /// Read each document back after upserting it.
    pub verify_after_write: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            vector_dimensions: DEFAULT_VECTOR_DIMENSIONS,
            concurrency: DEFAULT_CONCURRENCY,
            verify_after_write: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.vector_dimensions == 0 {
            return Err(IngestError::configuration(
                "Vector dimensions must be greater than zero",
            ));
        }
        if self.concurrency == 0 {
            return Err(IngestError::configuration(
                "Ingest concurrency must be greater than zero",
            ));
        }
        Ok(())
    }

    /// The prefix with a trailing `/`, or empty.
    fn normalized_prefix(&self) -> String {
        let trimmed = self.prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        }
    }
}

/// Orchestrator that ingests closed cases into the case index.
///
/// Collaborators are injected so the pipeline runs against fakes in tests.
pub struct IngestionOrchestrator {
    repository: CaseRepository,
    index: CaseIndexClient,
    detector: ChangeDetector,
    embedder: Arc<dyn EmbeddingProvider>,
    config: OrchestratorConfig,
}

impl IngestionOrchestrator {
    /// Create a new orchestrator with the default configuration.
    pub fn new(
        repository: CaseRepository,
        index: CaseIndexClient,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self::with_config(repository, index, embedder, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        repository: CaseRepository,
        index: CaseIndexClient,
        embedder: Arc<dyn EmbeddingProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            repository,
            detector: ChangeDetector::new(index.clone()),
            index,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Ingest every closed case under the configured prefix.
    ///
    /// Cases run independently; a failed case never aborts its siblings. A
    /// fatal error stops new cases from starting, lets in-flight cases finish
    /// and is then returned.
    ///
    /// A case id listed under more than one key is ingested from the first
    /// key only; every later key fails with `duplicate_case_id`, so one batch
    /// never writes the same doc_id twice.
    #[instrument(skip(self), fields(prefix = %self.config.prefix, concurrency = self.config.concurrency))]
    pub async fn ingest_all_closed_cases(&self) -> Result<BatchReport, IngestError> {
        self.config.validate()?;

        let paths = self
            .repository
            .list_case_paths(&self.config.normalized_prefix())
            .await
            .map_err(|e| IngestError::CaseListingFailed(e.to_string()))?;

        info!(cases = paths.len(), "Starting batch ingestion");

        let (paths, duplicates) = split_duplicate_cases(paths);
        let mut report = BatchReport::default();
        for (key, error) in duplicates {
            warn!(key = %key, error = %error, "Duplicate case id in listing");
            let label = case_id_from_key(&key).unwrap_or(key.as_str()).to_string();
            let outcome = IngestOutcome::from_error(label, &error);
            log_outcome(&outcome);
            report.record(outcome);
        }

        let halted = AtomicBool::new(false);
        let mut fatal: Option<IngestError> = None;

        // New cases are only pulled while no fatal error has been seen;
        // cases already in flight run to completion.
        let mut results = stream::iter(paths)
            .take_while(|_| future::ready(!halted.load(Ordering::SeqCst)))
            .map(|path| async move { self.ingest_case_at(&path).await })
            .buffer_unordered(self.config.concurrency);

        while let Some(result) = results.next().await {
            match result {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    if fatal.is_none() {
                        error!(error = %e, "Fatal error, halting batch");
                        fatal = Some(e);
                    }
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "Batch ingestion complete"
        );

        Ok(report)
    }

    /// Ingest a single case by id.
    pub async fn ingest_case(&self, case_id: &str) -> Result<IngestOutcome, IngestError> {
        let key = format!(
            "{}{}",
            self.config.normalized_prefix(),
            case_document_key(case_id)
        );
        self.ingest_case_at(&key).await
    }

    /// Ingest the case document stored at `key` and log its outcome.
    ///
    /// Returns `Err` only for fatal errors; those are logged as a FAILED
    /// outcome before being returned.
    #[instrument(skip(self))]
    pub async fn ingest_case_at(&self, key: &str) -> Result<IngestOutcome, IngestError> {
        let label = case_id_from_key(key).unwrap_or(key).to_string();

        let outcome = match self.process(key).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => {
                log_outcome(&IngestOutcome::from_error(&label, &e));
                return Err(e);
            }
            Err(e) => IngestOutcome::from_error(&label, &e),
        };

        log_outcome(&outcome);
        Ok(outcome)
    }

    async fn process(&self, key: &str) -> Result<IngestOutcome, IngestError> {
        // 1. Load and validate
        let path_case_id = case_id_from_key(key).map_err(|e| IngestError::schema(e.to_string()))?;
        let case = self
            .repository
            .load_case_at(key)
            .await
            .map_err(|e| IngestError::schema(e.to_string()))?;

        if case.case_id() != path_case_id {
            return Err(IngestError::schema(format!(
                "case_number '{}' does not match folder '{}'",
                case.case_id(),
                path_case_id
            )));
        }

        // 2. Eligibility
        if !case.is_closed() {
            return Err(IngestError::NotEligible {
                status: case.status().as_str().to_string(),
            });
        }

        // 3. doc_id
        let doc_id =
            DocId::derive(case.case_id()).map_err(|e| IngestError::InvalidDocId(e.to_string()))?;

        // 4. Projection and fingerprints
        let projection = build_projection(&case);
        let new_fingerprint = fingerprint(&projection);
        let existing = self.detector.lookup_existing_fingerprint(&doc_id).await?;

        // 5. Change decision
        match decide(existing.as_ref(), &new_fingerprint) {
            ChangeDecision::New => {}
            ChangeDecision::Unchanged => {
                return Ok(IngestOutcome::skipped(
                    case.case_id(),
                    ReasonCode::ContentHashUnchanged,
                    format!("{} is already indexed with identical content", doc_id),
                ));
            }
            ChangeDecision::Drifted { existing, new } => {
                debug!(existing = %existing, new = %new, "Fingerprint mismatch");
                return Err(IngestError::ContentDrift {
                    doc_id: doc_id.to_string(),
                });
            }
        }

        // 6. Embed
        let input = embedding_input(&projection);
        if input.is_empty() {
            return Err(IngestError::EmptyEmbeddingInput);
        }
        check_shape(&case)?;

        let vector = self.embedder.embed(&input).await?;
        check_dimensions(&vector, self.config.vector_dimensions)?;

        // 7. Assemble and upsert
        let document = assemble(&case, doc_id.clone(), projection, vector)?;
        let summary = self
            .index
            .upsert(std::slice::from_ref(&document))
            .await
            .map_err(|e| IngestError::index_write(e.to_string()))?;

        match summary.result_for(doc_id.as_str()) {
            Some(result) if result.success => {}
            Some(result) => {
                return Err(IngestError::index_write(
                    result
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "document rejected".to_string()),
                ));
            }
            None => {
                return Err(IngestError::index_write(format!(
                    "no result reported for {}",
                    doc_id
                )));
            }
        }

        if self.config.verify_after_write {
            self.verify_written(&doc_id).await?;
        }

        Ok(IngestOutcome::success(case.case_id()))
    }

    async fn verify_written(&self, doc_id: &DocId) -> Result<(), IngestError> {
        match self.index.get_by_key(doc_id.as_str()).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(IngestError::index_write(format!(
                "{} is not retrievable after upsert",
                doc_id
            ))),
            Err(e) => Err(IngestError::index_write(format!(
                "verification of {} failed: {}",
                doc_id, e
            ))),
        }
    }
}

/// Keep the first key of every case id and pair each later key with a
/// [`IngestError::DuplicateCase`]. The doc_id is derived from the case id
/// alone, so distinct case ids never share a doc_id. Keys without a
/// parseable case id are kept and fail on their own.
fn split_duplicate_cases(keys: Vec<String>) -> (Vec<String>, Vec<(String, IngestError)>) {
    let mut first_keys: HashMap<String, String> = HashMap::new();
    let mut unique = Vec::with_capacity(keys.len());
    let mut duplicates = Vec::new();

    for key in keys {
        let Ok(case_id) = case_id_from_key(&key).map(str::to_string) else {
            unique.push(key);
            continue;
        };
        match first_keys.get(&case_id) {
            Some(first_key) => {
                let error = IngestError::DuplicateCase {
                    case_id,
                    first_key: first_key.clone(),
                };
                duplicates.push((key, error));
            }
            None => {
                first_keys.insert(case_id, key.clone());
                unique.push(key);
            }
        }
    }

    (unique, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_duplicate_cases_keeps_first_key() {
        let keys = vec![
            "archive/INC-1/case.json".to_string(),
            "archive/INC-2/case.json".to_string(),
            "cases/INC-1/case.json".to_string(),
        ];

        let (unique, duplicates) = split_duplicate_cases(keys);

        assert_eq!(unique, vec!["archive/INC-1/case.json", "archive/INC-2/case.json"]);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].0, "cases/INC-1/case.json");
        assert!(matches!(
            &duplicates[0].1,
            IngestError::DuplicateCase { case_id, first_key }
                if case_id == "INC-1" && first_key == "archive/INC-1/case.json"
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(OrchestratorConfig::default().validate().is_ok());

        let zero_dims = OrchestratorConfig {
            vector_dimensions: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_dims.validate(),
            Err(IngestError::Configuration(_))
        ));

        let zero_workers = OrchestratorConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(zero_workers.validate().is_err());
    }

    #[test]
    fn test_normalized_prefix() {
        let with = |prefix: &str| OrchestratorConfig {
            prefix: prefix.to_string(),
            ..Default::default()
        };

        assert_eq!(with("").normalized_prefix(), "");
        assert_eq!(with("/").normalized_prefix(), "");
        assert_eq!(with("cases").normalized_prefix(), "cases/");
        assert_eq!(with("cases/").normalized_prefix(), "cases/");
    }
}
