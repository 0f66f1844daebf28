mod audio_item;
mod audio_item_state;
mod batch_id;
mod call_id;
mod call_record;
mod ledger;
mod storage_path;

pub use audio_item::{AudioItem, AudioUpload};
pub use audio_item_state::AudioItemState;
pub use batch_id::BatchId;
pub use call_id::{CallId, base_name, file_extension};
pub use call_record::{CLASSIFICATION_ERROR_LABEL, CallRecord};
pub use ledger::{
    CALL_ID_COLUMN, CLASSIFICATION_COLUMN, Ledger, REQUIRED_COLUMNS, TRANSCRIPT_COLUMN,
    UpsertOutcome,
};
pub use storage_path::StoragePath;
