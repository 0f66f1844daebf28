use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::Instrument;

use super::{
    AudioTranscriber, BatchReport, RelocationFailure, SkipReason, SkippedItem,
    TranscriptClassifier,
};
use crate::application::ports::{LedgerStore, LedgerStoreError, StagingStore, TranscriptionEngine};
use crate::domain::{
    AudioItem, AudioItemState, AudioUpload, BatchId, CallId, CallRecord, Ledger, StoragePath,
    file_extension,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// One save once every item reached a terminal state.
    PerBatch,
    /// A save after every recorded item.
    PerItem,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub allowed_extensions: Vec<String>,
    /// Where recorded audio is moved to; `None` deletes it instead.
    pub processed_prefix: Option<String>,
    /// Where skipped, unsaved or kept audio is parked for a later retry.
    pub failed_prefix: String,
    pub keep_audio_on_classification_error: bool,
    pub save_strategy: SaveStrategy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["mp3".to_string()],
            processed_prefix: None,
            failed_prefix: "failed".to_string(),
            keep_audio_on_classification_error: false,
            save_strategy: SaveStrategy::PerBatch,
        }
    }
}

/// Drives uploaded recordings through transcription, classification and the
/// ledger.
///
/// Items run one at a time in submission order. The whole
/// `load -> upsert* -> save` sequence of a batch holds `ledger_lock`, so two
/// batches in the same process never interleave their writes.
///
/// Staged audio of a recorded call is only released once a ledger save that
/// contains the call succeeded. Until then it stays under `incoming/`, and if
/// the batch ends without such a save it is parked under the failed prefix.
pub struct CallBatchService {
    transcriber: AudioTranscriber,
    classifier: TranscriptClassifier,
    ledger_store: Arc<dyn LedgerStore>,
    staging_store: Arc<dyn StagingStore>,
    options: BatchOptions,
    ledger_lock: Mutex<()>,
}

impl CallBatchService {
    pub fn new(
        transcription_engine: Arc<dyn TranscriptionEngine>,
        classifier: TranscriptClassifier,
        ledger_store: Arc<dyn LedgerStore>,
        staging_store: Arc<dyn StagingStore>,
        mut options: BatchOptions,
    ) -> Self {
        options.allowed_extensions = options
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            transcriber: AudioTranscriber::new(Arc::clone(&staging_store), transcription_engine),
            classifier,
            ledger_store,
            staging_store,
            options,
            ledger_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub async fn process_batch(
        &self,
        uploads: Vec<AudioUpload>,
    ) -> Result<BatchReport, CallBatchError> {
        let batch_id = BatchId::new();
        let items = self.validate(&batch_id, uploads)?;

        let span = tracing::info_span!("call_batch", batch_id = %batch_id, items = items.len());
        self.run_batch(batch_id, items).instrument(span).await
    }

    fn validate(
        &self,
        batch_id: &BatchId,
        uploads: Vec<AudioUpload>,
    ) -> Result<Vec<AudioItem>, BatchValidationError> {
        if uploads.is_empty() {
            return Err(BatchValidationError::EmptyBatch);
        }

        uploads
            .into_iter()
            .map(|upload| {
                let allowed = file_extension(&upload.filename).is_some_and(|ext| {
                    self.options
                        .allowed_extensions
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(ext))
                });
                if !allowed {
                    return Err(BatchValidationError::UnsupportedExtension {
                        filename: upload.filename,
                        allowed: self.options.allowed_extensions.join(", "),
                    });
                }

                let call_id = CallId::from_filename(&upload.filename).ok_or_else(|| {
                    BatchValidationError::MissingCallId {
                        filename: upload.filename.clone(),
                    }
                })?;
                let storage_path = StoragePath::incoming(batch_id, &upload.filename);

                Ok(AudioItem::new(
                    call_id,
                    upload.filename,
                    upload.data,
                    storage_path,
                ))
            })
            .collect()
    }

    async fn run_batch(
        &self,
        batch_id: BatchId,
        items: Vec<AudioItem>,
    ) -> Result<BatchReport, CallBatchError> {
        let _guard = self.ledger_lock.lock().await;

        let mut ledger = self.ledger_store.load().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load ledger, aborting batch");
            CallBatchError::LedgerLoad(e)
        })?;
        tracing::info!(rows = ledger.len(), "Ledger loaded");

        let mut report = BatchReport::new(batch_id);
        let mut pending = Vec::new();

        for item in items {
            let span = tracing::info_span!(
                "call_item",
                call_id = %item.call_id,
                filename = %item.filename,
            );
            let Some(recorded) = self
                .process_item(item, &mut ledger, &mut report)
                .instrument(span.clone())
                .await
            else {
                continue;
            };
            pending.push(recorded);

            if self.options.save_strategy == SaveStrategy::PerItem
                && self.save_ledger(&ledger, &mut report).await
            {
                self.release_audio(std::mem::take(&mut pending), &mut report)
                    .instrument(span)
                    .await;
            }
        }

        if self.options.save_strategy == SaveStrategy::PerBatch
            && self.save_ledger(&ledger, &mut report).await
        {
            self.release_audio(std::mem::take(&mut pending), &mut report)
                .await;
        }

        for recorded in pending {
            tracing::warn!(
                call_id = %recorded.item.call_id,
                "Ledger save failed, parking audio of unsaved call"
            );
            self.park_audio(&recorded.item, &mut report).await;
        }

        report.finish();

        tracing::info!(
            recorded = report.results.len(),
            skipped = report.skipped.len(),
            relocation_failures = report.relocation_failures.len(),
            persisted = report.persisted(),
            "Batch completed"
        );

        Ok(report)
    }

    async fn process_item(
        &self,
        mut item: AudioItem,
        ledger: &mut Ledger,
        report: &mut BatchReport,
    ) -> Option<RecordedAudio> {
        if let Err(e) = self
            .staging_store
            .store(&item.storage_path, item.data.clone())
            .await
        {
            tracing::warn!(
                error = %e,
                path = %item.storage_path,
                "Failed to stage audio, skipping"
            );
            item.transition(AudioItemState::Skipped);
            report.skipped.push(SkippedItem {
                call_id: item.call_id,
                filename: item.filename,
                reason: SkipReason::Staging(e.to_string()),
            });
            return None;
        }

        item.transition(AudioItemState::Transcribing);
        let transcript = match self
            .transcriber
            .transcribe(&item.storage_path, &item.filename)
            .await
        {
            Ok(text) => text,
            Err(failure) => {
                tracing::warn!(
                    error = %failure,
                    path = %item.storage_path,
                    "Transcription failed, skipping; audio parked for retry"
                );
                item.transition(AudioItemState::Skipped);
                self.park_audio(&item, report).await;
                report.skipped.push(SkippedItem {
                    call_id: item.call_id,
                    filename: item.filename,
                    reason: SkipReason::Transcription(failure),
                });
                return None;
            }
        };

        item.transition(AudioItemState::Classifying);
        let classification = self.classifier.classify(&transcript).await;

        let record = CallRecord::new(item.call_id.clone(), transcript, classification);
        let outcome = ledger.upsert(&record);
        item.transition(AudioItemState::Recorded);

        tracing::info!(
            outcome = ?outcome,
            classification = %record.classification,
            transcript_chars = record.transcript.len(),
            "Call recorded"
        );

        let unclassified = record.is_classification_error();
        report.results.push(record);
        Some(RecordedAudio { item, unclassified })
    }

    async fn release_audio(&self, recorded: Vec<RecordedAudio>, report: &mut BatchReport) {
        for entry in recorded {
            if self.options.keep_audio_on_classification_error && entry.unclassified {
                tracing::info!(
                    call_id = %entry.item.call_id,
                    "Keeping audio of unclassified call for retry"
                );
                self.park_audio(&entry.item, report).await;
            } else {
                self.dispose_audio(&entry.item, report).await;
            }
        }
    }

    async fn dispose_audio(&self, item: &AudioItem, report: &mut BatchReport) {
        let result = match &self.options.processed_prefix {
            Some(prefix) => {
                let target = StoragePath::processed(prefix, &report.batch_id, &item.filename);
                tracing::debug!(
                    from = %item.storage_path,
                    to = %target,
                    "Relocating processed audio"
                );
                self.staging_store.rename(&item.storage_path, &target).await
            }
            None => self.staging_store.delete(&item.storage_path).await,
        };

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                path = %item.storage_path,
                "Failed to relocate processed audio"
            );
            report.relocation_failures.push(RelocationFailure {
                call_id: item.call_id.clone(),
                error: e.to_string(),
            });
        }
    }

    async fn park_audio(&self, item: &AudioItem, report: &mut BatchReport) {
        let target =
            StoragePath::failed(&self.options.failed_prefix, &report.batch_id, &item.filename);
        if let Err(e) = self.staging_store.rename(&item.storage_path, &target).await {
            tracing::warn!(
                error = %e,
                path = %item.storage_path,
                "Failed to park audio for retry"
            );
            report.relocation_failures.push(RelocationFailure {
                call_id: item.call_id.clone(),
                error: e.to_string(),
            });
        }
    }

    async fn save_ledger(&self, ledger: &Ledger, report: &mut BatchReport) -> bool {
        match self.ledger_store.save(ledger).await {
            Ok(()) => {
                tracing::debug!(rows = ledger.len(), "Ledger saved");
                report.persistence_error = None;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to save ledger");
                report.persistence_error = Some(e.to_string());
                false
            }
        }
    }
}

struct RecordedAudio {
    item: AudioItem,
    unclassified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchValidationError {
    #[error("no audio files submitted")]
    EmptyBatch,
    #[error("unsupported file '{filename}', expected one of: {allowed}")]
    UnsupportedExtension { filename: String, allowed: String },
    #[error("cannot derive a call id from '{filename}'")]
    MissingCallId { filename: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CallBatchError {
    #[error("invalid batch: {0}")]
    Validation(#[from] BatchValidationError),
    #[error("ledger unavailable: {0}")]
    LedgerLoad(#[from] LedgerStoreError),
}
