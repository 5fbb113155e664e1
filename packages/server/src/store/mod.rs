//! Persistence of QR code and batch records.
//!
//! Handlers and the batch service only see the [`QrStore`] trait. The database
//! implementation backs the running server; the in-memory one backs tests and
//! throwaway runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

pub mod memory;
pub mod orm;

pub use memory::MemoryStore;
pub use orm::DbStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCodeRecord {
    pub id: String,
    pub url: String,
    /// Hex content hash of the PNG in the blob store.
    pub image_hash: Option<String>,
    pub image_size: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMember {
    pub position: i32,
    pub qrcode: QrCodeRecord,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait QrStore: Send + Sync {
    async fn find_qrcode(&self, id: &str) -> StoreResult<Option<QrCodeRecord>>;

    /// Atomically fetch the record with `id`, creating it with `url` if absent.
    ///
    /// The flag is `true` when this call created the record. Concurrent callers
    /// racing on the same id all receive the same record.
    async fn get_or_create_qrcode(&self, id: &str, url: &str)
    -> StoreResult<(QrCodeRecord, bool)>;

    /// Attach the image reference if the record has none yet. An existing
    /// reference is left untouched. Returns the record as stored.
    async fn attach_image(&self, id: &str, image_hash: &str, size: i64)
    -> StoreResult<QrCodeRecord>;

    /// Create a batch together with all of its members `(qrcode id, position)`.
    ///
    /// Either the batch and every member are stored, or nothing is. Listing the
    /// same QR code twice keeps its first position.
    async fn create_batch(&self, id: &str, members: &[(String, i32)]) -> StoreResult<BatchRecord>;

    async fn find_batch(&self, id: &str) -> StoreResult<Option<BatchRecord>>;

    /// Members of a batch ordered by position.
    async fn batch_members(&self, batch_id: &str) -> StoreResult<Vec<BatchMember>>;
}
