//! Batch ingestion over every case under a prefix.

mod common;

use std::time::Duration;

use case_indexer_pipeline::{IngestError, OrchestratorConfig, OutcomeStatus, ReasonCode};
use common::{closed_case, empty_closed_case, open_case, CountingEmbedder, Harness, DIMS};

#[tokio::test]
async fn test_failures_do_not_abort_siblings() {
    let h = Harness::new();
    h.put_case(&closed_case("INC-1")).await;
    h.put_case(&open_case("INC-2")).await;
    h.put_case(&empty_closed_case("INC-3")).await;
    h.store.put("INC-4/case.json", b"[]".to_vec()).await;
    h.put_case(&closed_case("INC-5")).await;
    h.store
        .put("INC-1/evidence/leak.jpg", vec![0xFF, 0xD8, 0xFF])
        .await;

    let report = h.orchestrator.ingest_all_closed_cases().await.unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 2);
    assert_eq!(report.count_reason(ReasonCode::StatusNotClosed), 1);
    assert_eq!(report.count_reason(ReasonCode::EmptyEmbeddingInput), 1);
    assert_eq!(report.count_reason(ReasonCode::SchemaValidationError), 1);
    assert_eq!(
        report.outcome_for("INC-5").map(|o| o.status),
        Some(OutcomeStatus::Success)
    );
    assert_eq!(h.index.len().await, 2);
    assert_eq!(h.embedder.calls(), 2);
}

#[tokio::test]
async fn test_second_batch_skips_everything() {
    let h = Harness::new();
    for id in ["INC-1", "INC-2", "INC-3"] {
        h.put_case(&closed_case(id)).await;
    }

    let first = h.orchestrator.ingest_all_closed_cases().await.unwrap();
    let second = h.orchestrator.ingest_all_closed_cases().await.unwrap();

    assert_eq!(first.succeeded, 3);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.count_reason(ReasonCode::ContentHashUnchanged), 3);
    assert_eq!(h.embedder.calls(), 3);
}

#[tokio::test]
async fn test_dimension_mismatch_halts_batch() {
    let h = Harness::with(
        CountingEmbedder::new(DIMS + 1),
        OrchestratorConfig {
            vector_dimensions: DIMS,
            concurrency: 1,
            ..Default::default()
        },
    );
    for id in ["INC-1", "INC-2", "INC-3"] {
        h.put_case(&closed_case(id)).await;
    }

    let err = h.orchestrator.ingest_all_closed_cases().await.unwrap_err();

    assert!(matches!(err, IngestError::DimensionMismatch { .. }));
    assert_eq!(h.embedder.calls(), 1);
    assert!(h.index.is_empty().await);
}

#[tokio::test]
async fn test_prefix_scopes_listing() {
    let h = Harness::with(
        CountingEmbedder::new(DIMS),
        OrchestratorConfig {
            prefix: "cases".to_string(),
            vector_dimensions: DIMS,
            ..Default::default()
        },
    );
    let case = serde_json::to_vec(&closed_case("INC-1")).unwrap();
    h.store.put("cases/INC-1/case.json", case.clone()).await;
    h.store.put("archive/INC-9/case.json", case).await;

    let report = h.orchestrator.ingest_all_closed_cases().await.unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);

    let single = h.orchestrator.ingest_case("INC-1").await.unwrap();
    assert_eq!(single.reason, Some(ReasonCode::ContentHashUnchanged));
}

#[tokio::test]
async fn test_empty_store() {
    let h = Harness::new();
    let report = h.orchestrator.ingest_all_closed_cases().await.unwrap();
    assert_eq!(report.total, 0);
    assert_eq!(h.index.get_calls(), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_listing() {
    let h = Harness::with(
        CountingEmbedder::new(DIMS),
        OrchestratorConfig {
            vector_dimensions: DIMS,
            concurrency: 0,
            ..Default::default()
        },
    );
    h.put_case(&closed_case("INC-1")).await;

    let err = h.orchestrator.ingest_all_closed_cases().await.unwrap_err();
    assert!(matches!(err, IngestError::Configuration(_)));
    assert_eq!(h.embedder.calls(), 0);
}

#[tokio::test]
async fn test_case_listed_twice_is_written_once() {
    let h = Harness::with(
        CountingEmbedder::slow(DIMS, Duration::from_millis(20)),
        OrchestratorConfig {
            vector_dimensions: DIMS,
            concurrency: 4,
            ..Default::default()
        },
    );
    let mut archived = closed_case("INC-1");
    archived["evidence"][0]["description"] = serde_json::json!("first");
    let mut current = closed_case("INC-1");
    current["evidence"][0]["description"] = serde_json::json!("second");
    h.store
        .put("archive/INC-1/case.json", serde_json::to_vec(&archived).unwrap())
        .await;
    h.store
        .put("cases/INC-1/case.json", serde_json::to_vec(&current).unwrap())
        .await;

    let report = h.orchestrator.ingest_all_closed_cases().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.count_reason(ReasonCode::DuplicateCaseId), 1);
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.index.upsert_calls(), 1);

    let stored = h.index.document("INC-1__case_index_v3").await.unwrap();
    assert_eq!(stored["evidence_descriptions"], "first");
}
