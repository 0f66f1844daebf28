use callscribe::application::services::{
    BatchOptions, BatchValidationError, CallBatchError, SaveStrategy, SkipReason,
    TranscriptionFailure,
};
use callscribe::domain::{AudioUpload, CallId, CallRecord, Ledger};

use crate::helpers::{
    FakeTranscriptionEngine, InMemoryLedgerStore, InMemoryStagingStore, Reply, ScriptedLlmClient,
    TestPipeline,
};

fn upload(name: &str) -> AudioUpload {
    AudioUpload::new(name, format!("ID3 audio of {}", name).into_bytes())
}

fn record(id: &str, transcript: &str, label: &str) -> CallRecord {
    CallRecord::new(CallId::new(id), transcript.to_string(), label.to_string())
}

#[tokio::test]
async fn given_two_recordings_when_processing_then_both_are_recorded_in_order() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::new(
            vec![Reply::Label("Complaint"), Reply::Label("Query")],
            Reply::Label("Other"),
        ),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    assert_eq!(
        report.results,
        vec![
            record("100", "transcript of 100.mp3", "Complaint"),
            record("101", "transcript of 101.mp3", "Query"),
        ]
    );
    assert!(report.skipped.is_empty());
    assert!(report.persisted());
    assert!(report.finished_at >= report.started_at);

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert_eq!(ledger.records().collect::<Vec<_>>(), report.results);
    assert_eq!(pipeline.ledger_store.save_count(), 1);
}

#[tokio::test]
async fn given_recorded_calls_when_batch_completes_then_staged_audio_is_removed() {
    let pipeline = TestPipeline::healthy();

    pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    assert!(pipeline.staging_store.keys().is_empty());
}

#[tokio::test]
async fn given_processed_prefix_when_batch_completes_then_audio_is_moved_there() {
    let options = BatchOptions {
        processed_prefix: Some("processed".to_string()),
        ..BatchOptions::default()
    };
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        options,
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert_eq!(
        pipeline.staging_store.keys(),
        vec![format!("processed/{}/100.mp3", report.batch_id)]
    );
}

#[tokio::test]
async fn given_transcription_failure_when_processing_then_item_is_skipped_and_others_continue() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::failing_on(&["100.mp3"]),
        ScriptedLlmClient::always(Reply::Label("Compliment")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    assert_eq!(report.results, vec![record("101", "transcript of 101.mp3", "Compliment")]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].call_id, CallId::new("100"));
    assert!(matches!(
        report.skipped[0].reason,
        SkipReason::Transcription(TranscriptionFailure::ProcessingError(_))
    ));

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert!(ledger.get(&CallId::new("100")).is_none());
    assert_eq!(pipeline.llm.call_count(), 1);
    assert_eq!(
        pipeline.staging_store.keys(),
        vec![format!("failed/{}/100.mp3", report.batch_id)]
    );
}

#[tokio::test]
async fn given_unsupported_extension_when_processing_then_whole_batch_is_rejected() {
    let pipeline = TestPipeline::healthy();

    let result = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("notes.txt")])
        .await;

    assert!(matches!(
        result,
        Err(CallBatchError::Validation(
            BatchValidationError::UnsupportedExtension { ref filename, .. }
        )) if filename == "notes.txt"
    ));
    assert_eq!(pipeline.ledger_store.load_count(), 0);
    assert!(pipeline.engine.calls().is_empty());
    assert!(pipeline.staging_store.keys().is_empty());
}

#[tokio::test]
async fn given_empty_batch_when_processing_then_validation_fails() {
    let pipeline = TestPipeline::healthy();

    let result = pipeline.service.process_batch(Vec::new()).await;

    assert!(matches!(
        result,
        Err(CallBatchError::Validation(BatchValidationError::EmptyBatch))
    ));
}

#[tokio::test]
async fn given_uppercase_extension_when_processing_then_it_is_accepted() {
    let pipeline = TestPipeline::healthy();

    let report = pipeline
        .service
        .process_batch(vec![upload("200.MP3")])
        .await
        .unwrap();

    assert_eq!(report.results[0].call_id, CallId::new("200"));
}

#[tokio::test]
async fn given_same_call_twice_when_processing_then_ledger_keeps_one_row_with_latest_values() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::new(vec![Reply::Label("Query")], Reply::Label("Complaint")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    pipeline.service.process_batch(vec![upload("100.mp3")]).await.unwrap();
    pipeline.service.process_batch(vec![upload("100.mp3")]).await.unwrap();

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(
        ledger.get(&CallId::new("100")),
        Some(record("100", "transcript of 100.mp3", "Complaint"))
    );
}

#[tokio::test]
async fn given_existing_ledger_when_processing_then_unrelated_rows_are_kept() {
    let mut existing = Ledger::empty();
    existing.upsert(&record("042", "older call", "Other"));
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::with_ledger(existing),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    pipeline.service.process_batch(vec![upload("100.mp3")]).await.unwrap();

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(
        ledger.get(&CallId::new("042")),
        Some(record("042", "older call", "Other"))
    );
}

#[tokio::test]
async fn given_unusable_classifier_when_processing_then_call_is_recorded_with_error_label() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Failure),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert_eq!(report.results, vec![record("100", "transcript of 100.mp3", "Error")]);
    assert!(pipeline.staging_store.keys().is_empty());
}

#[tokio::test]
async fn given_keep_on_error_when_classification_fails_then_audio_is_parked_for_retry() {
    let options = BatchOptions {
        processed_prefix: Some("processed".to_string()),
        keep_audio_on_classification_error: true,
        ..BatchOptions::default()
    };
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::new(vec![Reply::Failure], Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        options,
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    assert_eq!(
        pipeline.staging_store.keys(),
        vec![
            format!("failed/{}/100.mp3", report.batch_id),
            format!("processed/{}/101.mp3", report.batch_id),
        ]
    );
}

#[tokio::test]
async fn given_ledger_load_failure_when_processing_then_batch_aborts_before_any_work() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::failing_load(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let result = pipeline.service.process_batch(vec![upload("100.mp3")]).await;

    assert!(matches!(result, Err(CallBatchError::LedgerLoad(_))));
    assert!(pipeline.engine.calls().is_empty());
    assert_eq!(pipeline.ledger_store.save_count(), 0);
}

#[tokio::test]
async fn given_ledger_save_failure_when_processing_then_results_are_reported_as_not_persisted() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::failing_save(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(!report.persisted());
    assert!(report.persistence_error.unwrap().contains("disk full"));
    assert_eq!(
        pipeline.staging_store.keys(),
        vec![format!("failed/{}/100.mp3", report.batch_id)]
    );
}

#[tokio::test(start_paused = true)]
async fn given_batch_dropped_mid_run_when_nothing_was_saved_then_recorded_audio_stays_staged() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::holding("101.mp3"),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(60),
        pipeline
            .service
            .process_batch(vec![upload("100.mp3"), upload("101.mp3")]),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(pipeline.llm.call_count(), 1);
    assert_eq!(pipeline.ledger_store.save_count(), 0);
    let keys = pipeline.staging_store.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.starts_with("incoming/")));
    assert!(keys.iter().any(|k| k.ends_with("/100.mp3")));
}

#[tokio::test]
async fn given_per_item_strategy_when_later_save_recovers_then_earlier_audio_is_released() {
    let options = BatchOptions {
        save_strategy: SaveStrategy::PerItem,
        processed_prefix: Some("processed".to_string()),
        ..BatchOptions::default()
    };
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::failing_first_saves(1),
        InMemoryStagingStore::default(),
        options,
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    assert!(report.persisted());
    assert_eq!(pipeline.ledger_store.save_count(), 2);
    assert_eq!(pipeline.ledger_store.persisted().unwrap().len(), 2);
    assert_eq!(
        pipeline.staging_store.keys(),
        vec![
            format!("processed/{}/100.mp3", report.batch_id),
            format!("processed/{}/101.mp3", report.batch_id),
        ]
    );
}

#[tokio::test]
async fn given_per_item_strategy_when_processing_then_ledger_is_saved_after_each_call() {
    let options = BatchOptions {
        save_strategy: SaveStrategy::PerItem,
        ..BatchOptions::default()
    };
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::failing_on(&["102.mp3"]),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        options,
    );

    pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3"), upload("102.mp3")])
        .await
        .unwrap();

    assert_eq!(pipeline.ledger_store.save_count(), 2);
    assert_eq!(pipeline.ledger_store.persisted().unwrap().len(), 2);
}

#[tokio::test]
async fn given_staging_failure_when_processing_then_item_is_skipped_with_staging_reason() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::failing_store(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert!(report.results.is_empty());
    assert!(matches!(report.skipped[0].reason, SkipReason::Staging(_)));
    assert!(pipeline.engine.calls().is_empty());
}

#[tokio::test]
async fn given_relocation_failure_when_processing_then_call_is_still_recorded() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::Label("Query")),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::failing_relocation(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.relocation_failures.len(), 1);
    assert_eq!(report.relocation_failures[0].call_id, CallId::new("100"));
    assert!(report.persisted());
}

#[tokio::test]
async fn given_concurrent_batches_when_processing_then_no_update_is_lost() {
    let pipeline = TestPipeline::healthy();

    let (first, second) = tokio::join!(
        pipeline.service.process_batch(vec![upload("100.mp3")]),
        pipeline.service.process_batch(vec![upload("101.mp3")]),
    );
    first.unwrap();
    second.unwrap();

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger.get(&CallId::new("100")).is_some());
    assert!(ledger.get(&CallId::new("101")).is_some());
}

#[tokio::test]
async fn given_ledger_holding_first_call_when_processing_two_then_one_is_updated_and_one_appended() {
    let mut existing = Ledger::empty();
    existing.upsert(&record("100", "stale transcript", "Other"));
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::new(
            vec![Reply::Label("Complaint"), Reply::Label("Query")],
            Reply::Label("Other"),
        ),
        InMemoryLedgerStore::with_ledger(existing),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3"), upload("101.mp3")])
        .await
        .unwrap();

    let ledger = pipeline.ledger_store.persisted().unwrap();
    assert_eq!(
        ledger.records().collect::<Vec<_>>(),
        vec![
            record("100", "transcript of 100.mp3", "Complaint"),
            record("101", "transcript of 101.mp3", "Query"),
        ]
    );
    assert_eq!(report.results, ledger.records().collect::<Vec<_>>());
}

#[tokio::test]
async fn given_same_batch_run_twice_when_processing_then_final_ledger_matches_single_run() {
    let pipeline = TestPipeline::healthy();
    let batch = || vec![upload("100.mp3"), upload("101.mp3")];

    pipeline.service.process_batch(batch()).await.unwrap();
    let after_once = pipeline.ledger_store.persisted().unwrap();
    pipeline.service.process_batch(batch()).await.unwrap();
    let after_twice = pipeline.ledger_store.persisted().unwrap();

    assert_eq!(after_once, after_twice);
}

#[tokio::test]
async fn given_classifier_always_rate_limited_when_processing_then_call_is_recorded_as_error() {
    let pipeline = TestPipeline::new(
        FakeTranscriptionEngine::default(),
        ScriptedLlmClient::always(Reply::RateLimited),
        InMemoryLedgerStore::default(),
        InMemoryStagingStore::default(),
        BatchOptions::default(),
    );

    let report = pipeline
        .service
        .process_batch(vec![upload("100.mp3")])
        .await
        .unwrap();

    assert_eq!(pipeline.llm.call_count(), 5);
    assert_eq!(report.results, vec![record("100", "transcript of 100.mp3", "Error")]);
    assert_eq!(
        pipeline.ledger_store.persisted().unwrap().get(&CallId::new("100")),
        Some(record("100", "transcript of 100.mp3", "Error"))
    );
}
