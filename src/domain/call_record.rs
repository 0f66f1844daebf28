use serde::Serialize;

use super::CallId;

/// Label recorded when the classifier gave up on a transcript.
pub const CLASSIFICATION_ERROR_LABEL: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub call_id: CallId,
    pub transcript: String,
    pub classification: String,
}

impl CallRecord {
    pub fn new(call_id: CallId, transcript: String, classification: String) -> Self {
        Self {
            call_id,
            transcript,
            classification,
        }
    }

    pub fn is_classification_error(&self) -> bool {
        self.classification == CLASSIFICATION_ERROR_LABEL
    }
}
