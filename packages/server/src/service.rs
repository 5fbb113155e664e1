use std::sync::Arc;

use common::archive::{self, ArchiveError, StoredImage};
use common::storage::{BlobStore, ContentHash, StorageError};
use common::{QrImageBuilder, QrImageError, new_batch_id, qrcode_id};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::store::{BatchMember, BatchRecord, QrCodeRecord, QrStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Image(#[from] QrImageError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// A URL of a batch that did not make it into the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItemError {
    /// 1-based spreadsheet data row, when known.
    pub row: Option<usize>,
    pub url: Option<String>,
    pub message: String,
}

/// A created batch together with its members and the URLs that failed.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch: BatchRecord,
    pub members: Vec<BatchMember>,
    pub errors: Vec<BatchItemError>,
}

/// Get-or-create of QR codes and batch assembly on top of the record store
/// and the image blob store.
pub struct QrService {
    store: Arc<dyn QrStore>,
    blobs: Arc<dyn BlobStore>,
    builder: QrImageBuilder,
}

impl QrService {
    pub fn new(store: Arc<dyn QrStore>, blobs: Arc<dyn BlobStore>, builder: QrImageBuilder) -> Self {
        Self {
            store,
            blobs,
            builder,
        }
    }

    /// Return the record for a normalized URL, generating and storing its
    /// image if the record is new or has no image yet.
    #[instrument(skip(self))]
    pub async fn ensure_qrcode(&self, url: &str) -> Result<QrCodeRecord, ServiceError> {
        let id = qrcode_id(url);
        let (record, created) = self.store.get_or_create_qrcode(&id, url).await?;
        if record.image_hash.is_some() {
            return Ok(record);
        }

        let png = self.builder.build_png(url)?;
        let hash = self.blobs.put(&png).await?;
        let size = i64::try_from(png.len()).unwrap_or(i64::MAX);
        let record = self.store.attach_image(&id, &hash.to_hex(), size).await?;

        info!(id = %record.id, created, size, "QR image stored");
        Ok(record)
    }

    /// Create a batch from deduplicated, normalized URLs.
    ///
    /// URLs the encoder rejects are reported in [`BatchOutcome::errors`]; any
    /// storage failure aborts the request before the batch is recorded.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn create_batch(&self, urls: &[String]) -> Result<BatchOutcome, ServiceError> {
        let mut members = Vec::with_capacity(urls.len());
        let mut errors = Vec::new();

        for (position, url) in urls.iter().enumerate() {
            match self.ensure_qrcode(url).await {
                Ok(record) => {
                    let position = i32::try_from(position).unwrap_or(i32::MAX);
                    members.push((record.id, position));
                }
                Err(ServiceError::Image(e)) => {
                    warn!(%url, error = %e, "Skipping URL");
                    errors.push(BatchItemError {
                        row: None,
                        url: Some(url.clone()),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let batch = self.store.create_batch(&new_batch_id(), &members).await?;
        let members = self.store.batch_members(&batch.id).await?;
        info!(batch_id = %batch.id, members = members.len(), failed = errors.len(), "Batch created");

        Ok(BatchOutcome {
            batch,
            members,
            errors,
        })
    }

    pub async fn find_qrcode(&self, id: &str) -> Result<QrCodeRecord, ServiceError> {
        self.store
            .find_qrcode(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("QR code not found".into()))
    }

    pub async fn find_batch(&self, id: &str) -> Result<(BatchRecord, Vec<BatchMember>), ServiceError> {
        let batch = self
            .store
            .find_batch(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Batch not found".into()))?;
        let members = self.store.batch_members(id).await?;
        Ok((batch, members))
    }

    /// PNG bytes of a record, or `None` if it has no image or the blob is gone.
    pub async fn load_image(&self, record: &QrCodeRecord) -> Result<Option<Vec<u8>>, ServiceError> {
        let Some(hex) = record.image_hash.as_deref() else {
            return Ok(None);
        };
        let hash = ContentHash::from_hex(hex)?;
        match self.blobs.get(&hash).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Build the ZIP archive of a batch. Members whose image cannot be read
    /// are logged and left out.
    #[instrument(skip(self))]
    pub async fn batch_archive(&self, batch_id: &str) -> Result<Vec<u8>, ServiceError> {
        let (_, members) = self.find_batch(batch_id).await?;
        if members.is_empty() {
            return Err(ServiceError::NotFound("No QR codes found in batch".into()));
        }

        let mut items = Vec::with_capacity(members.len());
        for member in members {
            let bytes = match self.load_image(&member.qrcode).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(id = %member.qrcode.id, error = %e, "Cannot read stored image");
                    None
                }
            };
            items.push(StoredImage {
                position: u32::try_from(member.position).unwrap_or(0),
                url: member.qrcode.url,
                bytes,
            });
        }

        Ok(archive::pack_stored(items)?)
    }
}
