use std::fmt;

use chrono::{DateTime, Utc};

use super::TranscriptionFailure;
use crate::domain::{BatchId, CallId, CallRecord};

/// Everything a caller learns about one processed batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Recorded calls, in submission order.
    pub results: Vec<CallRecord>,
    pub skipped: Vec<SkippedItem>,
    pub relocation_failures: Vec<RelocationFailure>,
    /// Outcome of the last ledger save; `None` means the ledger is durable.
    pub persistence_error: Option<String>,
}

impl BatchReport {
    pub(crate) fn new(batch_id: BatchId) -> Self {
        let now = Utc::now();
        Self {
            batch_id,
            started_at: now,
            finished_at: now,
            results: Vec::new(),
            skipped: Vec::new(),
            relocation_failures: Vec::new(),
            persistence_error: None,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn persisted(&self) -> bool {
        self.persistence_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub call_id: CallId,
    pub filename: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Staging(String),
    Transcription(TranscriptionFailure),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Staging(msg) => write!(f, "staging: {}", msg),
            SkipReason::Transcription(failure) => write!(f, "transcription: {}", failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationFailure {
    pub call_id: CallId,
    pub error: String,
}
