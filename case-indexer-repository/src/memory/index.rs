//! In-memory [`SearchIndexProvider`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BatchOperationResult, BatchOperationSummary};
use case_indexer_shared::{DocId, IndexDocument, CASE_INDEX_NAME};

/// Search index held in a map keyed by doc_id.
pub struct InMemorySearchIndex {
    name: String,
    documents: RwLock<BTreeMap<String, Value>>,
    exists: AtomicBool,
    fail_lookups: AtomicBool,
    fail_upserts: AtomicBool,
    discard_writes: AtomicBool,
    get_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl InMemorySearchIndex {
    /// An existing, empty canonical index.
    pub fn new() -> Self {
        Self {
            name: CASE_INDEX_NAME.to_string(),
            documents: RwLock::new(BTreeMap::new()),
            exists: AtomicBool::new(true),
            fail_lookups: AtomicBool::new(false),
            fail_upserts: AtomicBool::new(false),
            discard_writes: AtomicBool::new(false),
            get_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// An index that has not been created yet.
    pub fn missing() -> Self {
        let index = Self::new();
        index.exists.store(false, Ordering::SeqCst);
        index
    }

    /// Make every lookup fail with a connection error.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every upsert item fail as if the index rejected the document.
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Acknowledge upserts without storing them.
    pub fn set_discard_writes(&self, discard: bool) {
        self.discard_writes.store(discard, Ordering::SeqCst);
    }

    /// Store a raw source under `doc_id`, bypassing the upsert path.
    pub async fn insert_raw(&self, doc_id: impl Into<String>, source: Value) {
        self.documents.write().await.insert(doc_id.into(), source);
    }

    /// The stored source of a document.
    pub async fn document(&self, doc_id: &str) -> Option<Value> {
        self.documents.read().await.get(doc_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Number of `get_document` calls made so far.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `upsert_documents` calls made so far.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchIndexProvider for InMemorySearchIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    async fn get_document(&self, doc_id: &DocId) -> Result<Option<Value>, SearchIndexError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection("in-memory index unavailable"));
        }
        Ok(self.documents.read().await.get(doc_id.as_str()).cloned())
    }

    async fn upsert_documents(
        &self,
        documents: &[IndexDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        let fail = self.fail_upserts.load(Ordering::SeqCst);
        let discard = self.discard_writes.load(Ordering::SeqCst);
        let mut stored = self.documents.write().await;
        let mut results = Vec::with_capacity(documents.len());

        for doc in documents {
            let doc_id = doc.doc_id.as_str();
            if fail {
                results.push(BatchOperationResult::failed(
                    doc_id,
                    SearchIndexError::index("document rejected by index"),
                ));
                continue;
            }

            if stored.contains_key(doc_id) {
                results.push(BatchOperationResult::failed(
                    doc_id,
                    SearchIndexError::document_exists(doc_id),
                ));
                continue;
            }

            match serde_json::to_value(doc) {
                Ok(source) => {
                    if !discard {
                        stored.insert(doc_id.to_string(), source);
                    }
                    results.push(BatchOperationResult::succeeded(doc_id));
                }
                Err(e) => results.push(BatchOperationResult::failed(
                    doc_id,
                    SearchIndexError::validation(e.to_string()),
                )),
            }
        }

        Ok(BatchOperationSummary::from_results(results))
    }

    async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        Ok(self.exists.load(Ordering::SeqCst))
    }

    async fn create_index(&self) -> Result<(), SearchIndexError> {
        if self.exists.swap(true, Ordering::SeqCst) {
            return Err(SearchIndexError::index_management("index already exists"));
        }
        Ok(())
    }
}
