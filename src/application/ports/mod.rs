mod ledger_store;
mod llm_client;
mod staging_store;
mod transcription_engine;

pub use ledger_store::{LedgerStore, LedgerStoreError};
pub use llm_client::{LlmClient, LlmClientError};
pub use staging_store::{StagingStore, StagingStoreError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
