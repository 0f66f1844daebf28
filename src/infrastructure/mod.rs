pub mod audio;
pub mod ledger;
pub mod llm;
pub mod observability;
pub mod storage;
