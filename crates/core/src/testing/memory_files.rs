//! In-memory file store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::speaker_portal::{FileStore, FileStoreError};

/// Keeps uploaded files in a map keyed by name.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn saved_names(&self) -> Vec<String> {
        self.files.read().await.keys().cloned().collect()
    }

    pub async fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(name).cloned()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<String, FileStoreError> {
        self.files
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(format!("memory://{}", name))
    }
}
