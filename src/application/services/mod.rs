mod audio_transcriber;
mod batch_report;
mod call_batch_service;
mod transcript_classifier;

pub use audio_transcriber::{AudioTranscriber, TranscriptionFailure};
pub use batch_report::{BatchReport, RelocationFailure, SkipReason, SkippedItem};
pub use call_batch_service::{
    BatchOptions, BatchValidationError, CallBatchError, CallBatchService, SaveStrategy,
};
pub use transcript_classifier::{
    ClassificationFailure, DEFAULT_BACKOFF_BASE, DEFAULT_INSTRUCTIONS, DEFAULT_LABELS,
    DEFAULT_MAX_ATTEMPTS, RetryPolicy, TranscriptClassifier, render_instructions,
};
