//! Fixtures shared by the pipeline integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use case_indexer_pipeline::{
    EmbeddingError, EmbeddingProvider, IngestionOrchestrator, OrchestratorConfig,
};
use case_indexer_repository::{
    CaseIndexClient, CaseRepository, InMemoryDocumentStore, InMemorySearchIndex,
};

pub const DIMS: usize = 8;

/// Embedder returning a constant vector and counting its calls.
pub struct CountingEmbedder {
    dims: usize,
    calls: AtomicUsize,
    fail: bool,
    delay: Option<Duration>,
}

impl CountingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
            fail: false,
            delay: None,
        }
    }

    /// Sleeps before answering, so concurrent cases overlap.
    pub fn slow(dims: usize, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(dims)
        }
    }

    pub fn failing() -> Self {
        Self {
            dims: DIMS,
            calls: AtomicUsize::new(0),
            fail: true,
            delay: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn name(&self) -> &str {
        "counting"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(vec![0.25; self.dims])
    }
}

pub struct Harness {
    pub store: Arc<InMemoryDocumentStore>,
    pub index: Arc<InMemorySearchIndex>,
    pub embedder: Arc<CountingEmbedder>,
    pub orchestrator: IngestionOrchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(CountingEmbedder::new(DIMS), OrchestratorConfig {
            vector_dimensions: DIMS,
            ..Default::default()
        })
    }

    pub fn with(embedder: CountingEmbedder, config: OrchestratorConfig) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let index = Arc::new(InMemorySearchIndex::new());
        let embedder = Arc::new(embedder);

        let orchestrator = IngestionOrchestrator::with_config(
            CaseRepository::new(store.clone()),
            CaseIndexClient::new(index.clone()),
            embedder.clone(),
            config,
        );

        Self {
            store,
            index,
            embedder,
            orchestrator,
        }
    }

    pub async fn put_case(&self, case: &Value) {
        let case_id = case["case"]["case_number"].as_str().unwrap_or_default();
        self.store
            .put(
                format!("{}/case.json", case_id),
                serde_json::to_vec_pretty(case).unwrap(),
            )
            .await;
    }
}

/// A closed case with content in every projected section.
pub fn closed_case(case_id: &str) -> Value {
    json!({
        "case": {
            "case_number": case_id,
            "opening_date": "2026-01-22T08:00:00",
            "closure_date": "2026-02-03T17:00:00Z",
            "status": "closed"
        },
        "evidence": [
            {"filename": "leak.jpg", "description": "Photo of the leak", "tags": ["leak", "line4"]}
        ],
        "phases": {
            "D1_D2": {"header": {"completed": true}, "data": {
                "problem_description": "Oil leak on line 4",
                "team_members": ["Ana", "Luis"],
                "organization": {"country": "ES", "site": "Madrid", "department": "Assembly"}
            }},
            "D3": {"header": {"completed": true}, "data": {
                "what_happened": "Oil on the floor next to the press",
                "where": "Line 4"
            }},
            "D4": {"header": {"completed": true}, "data": {"actions": [{"action": "Clean area"}]}},
            "D5": {"header": {"completed": true}, "data": {
                "fishbone": {"people": ["fatigue"], "methods": ["no checklist"]},
                "five_whys": {"A": ["Leak", "Seal worn"]}
            }},
            "D6": {"header": {"completed": true}, "data": {"actions": [{"action": "Replace seals"}]}},
            "D7": {"header": {"completed": true}, "data": {}},
            "D8": {"header": {"completed": true}, "data": {}}
        },
        "ai": {"summary": "Seal wear caused the leak."},
        "meta": {"version": 4, "created_at": "2026-01-22T08:00:00"}
    })
}

/// A closed case whose projection holds no text.
pub fn empty_closed_case(case_id: &str) -> Value {
    json!({
        "case": {
            "case_number": case_id,
            "opening_date": "2026-01-22T08:00:00",
            "status": "closed"
        },
        "phases": {},
        "meta": {"version": 1, "created_at": "2026-01-22T08:00:00"}
    })
}

pub fn open_case(case_id: &str) -> Value {
    let mut case = closed_case(case_id);
    case["case"]["status"] = json!("open");
    case
}
