use bytes::Bytes;

use super::{AudioItemState, CallId, StoragePath};

/// A file as submitted by the caller, before validation.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub data: Bytes,
}

impl AudioUpload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// One recording moving through a batch.
#[derive(Debug, Clone)]
pub struct AudioItem {
    pub call_id: CallId,
    pub filename: String,
    pub data: Bytes,
    pub storage_path: StoragePath,
    state: AudioItemState,
}

impl AudioItem {
    pub fn new(call_id: CallId, filename: String, data: Bytes, storage_path: StoragePath) -> Self {
        Self {
            call_id,
            filename,
            data,
            storage_path,
            state: AudioItemState::Received,
        }
    }

    pub fn state(&self) -> AudioItemState {
        self.state
    }

    /// Moves the item to `next`, ignoring transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: AudioItemState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                call_id = %self.call_id,
                from = %self.state,
                to = %next,
                "Rejected audio item state transition"
            );
            return false;
        }
        tracing::debug!(
            call_id = %self.call_id,
            from = %self.state,
            to = %next,
            "Audio item state transition"
        );
        self.state = next;
        true
    }
}
