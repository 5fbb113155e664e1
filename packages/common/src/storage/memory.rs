use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::BlobStore;

/// Non-durable image store for tests and local runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<ContentHash, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Drop a blob, simulating storage loss.
    pub fn remove(&self, hash: &ContentHash) -> bool {
        self.blobs.remove(hash).is_some()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        let hash = ContentHash::compute(data);
        self.blobs.entry(hash).or_insert_with(|| data.to_vec());
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .get(hash)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(hash.to_hex()))
    }
}
