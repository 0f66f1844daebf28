use std::io;

use async_trait::async_trait;

use crate::domain::Ledger;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reads the persisted ledger, or an empty one when nothing is persisted yet.
    async fn load(&self) -> Result<Ledger, LedgerStoreError>;

    /// Replaces the persisted ledger. Readers never observe a partial write.
    async fn save(&self, ledger: &Ledger) -> Result<(), LedgerStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("malformed ledger: {0}")]
    Malformed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
