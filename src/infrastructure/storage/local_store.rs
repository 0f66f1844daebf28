use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::domain::StoragePath;

/// Staging area rooted in a local directory.
pub struct LocalStagingStore {
    inner: Arc<LocalFileSystem>,
    base_path: PathBuf,
}

impl LocalStagingStore {
    pub fn new(base_path: PathBuf) -> Result<Self, StagingStoreError> {
        std::fs::create_dir_all(&base_path).map_err(StagingStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
            base_path,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

fn store_path(path: &StoragePath) -> Result<StorePath, StagingStoreError> {
    StorePath::parse(path.as_str())
        .map_err(|e| StagingStoreError::UploadFailed(format!("invalid path {}: {}", path, e)))
}

#[async_trait::async_trait]
impl StagingStore for LocalStagingStore {
    async fn store(&self, path: &StoragePath, data: Bytes) -> Result<u64, StagingStoreError> {
        let location = store_path(path)?;
        let size = data.len() as u64;
        self.inner
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| StagingStoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(path = %path, bytes = size, "Audio staged");
        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Vec<u8>, StagingStoreError> {
        let location = store_path(path)?;
        let result = self.inner.get(&location).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => StagingStoreError::NotFound(path.to_string()),
            other => StagingStoreError::DownloadFailed(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StagingStoreError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, path: &StoragePath) -> Result<(), StagingStoreError> {
        let location = store_path(path)?;
        self.inner
            .delete(&location)
            .await
            .map_err(|e| StagingStoreError::DeleteFailed(e.to_string()))
    }

    async fn rename(&self, from: &StoragePath, to: &StoragePath) -> Result<(), StagingStoreError> {
        let source = store_path(from)?;
        let target = store_path(to)?;
        self.inner
            .rename(&source, &target)
            .await
            .map_err(|e| StagingStoreError::RenameFailed(format!("{} -> {}: {}", from, to, e)))
    }
}
