use std::sync::Arc;

use crate::application::ports::{StagingStore, StagingStoreError, TranscriptionEngine};
use crate::domain::StoragePath;

/// Reads a staged recording and turns it into text. Never retries: a failure
/// here is final for the item.
pub struct AudioTranscriber {
    staging_store: Arc<dyn StagingStore>,
    engine: Arc<dyn TranscriptionEngine>,
}

impl AudioTranscriber {
    pub fn new(staging_store: Arc<dyn StagingStore>, engine: Arc<dyn TranscriptionEngine>) -> Self {
        Self {
            staging_store,
            engine,
        }
    }

    pub async fn transcribe(
        &self,
        path: &StoragePath,
        filename: &str,
    ) -> Result<String, TranscriptionFailure> {
        let audio = self
            .staging_store
            .fetch(path)
            .await
            .map_err(|e| match e {
                StagingStoreError::NotFound(msg) => TranscriptionFailure::NotFound(msg),
                other => TranscriptionFailure::ProcessingError(other.to_string()),
            })?;

        tracing::debug!(bytes = audio.len(), path = %path, "Starting audio transcription");

        self.engine
            .transcribe(&audio, filename)
            .await
            .map_err(|e| TranscriptionFailure::ProcessingError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptionFailure {
    #[error("audio not found: {0}")]
    NotFound(String),
    #[error("processing error: {0}")]
    ProcessingError(String),
}
