use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;

/// Image blob storage addressed by the SHA-256 of the content.
///
/// Storing the same bytes twice yields the same hash and keeps a single copy.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their content hash.
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError>;

    /// Retrieve all bytes of a blob.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError>;
}
