//! Upload storage backend
//!
//! Realm scrubbing deletes uploaded files in batches through
//! [`UploadBackend`].

use async_trait::async_trait;
use realm_org::RealmResult;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// File storage for uploads.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Delete stored files by path id.
    async fn delete_files(&self, path_ids: &[String]) -> RealmResult<()>;
}

/// In-memory upload storage.
///
/// Records each delete batch so callers can check batching.
#[derive(Debug, Clone, Default)]
pub struct MemoryUploadBackend {
    files: Arc<RwLock<BTreeSet<String>>>,
    delete_batches: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MemoryUploadBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file.
    pub async fn store_file(&self, path_id: impl Into<String>) {
        self.files.write().await.insert(path_id.into());
    }

    /// Whether a file is stored.
    pub async fn contains(&self, path_id: &str) -> bool {
        self.files.read().await.contains(path_id)
    }

    /// Number of stored files.
    pub async fn file_count(&self) -> usize {
        self.files.read().await.len()
    }

    /// Batches passed to `delete_files`, in call order.
    pub async fn delete_batches(&self) -> Vec<Vec<String>> {
        self.delete_batches.read().await.clone()
    }
}

#[async_trait]
impl UploadBackend for MemoryUploadBackend {
    async fn delete_files(&self, path_ids: &[String]) -> RealmResult<()> {
        {
            let mut files = self.files.write().await;
            for path_id in path_ids {
                files.remove(path_id);
            }
        }
        self.delete_batches.write().await.push(path_ids.to_vec());
        Ok(())
    }
}
