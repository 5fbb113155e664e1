use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{BatchMember, BatchRecord, QrCodeRecord, QrStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    qrcodes: HashMap<String, QrCodeRecord>,
    batches: HashMap<String, BatchRecord>,
    /// batch id -> (position, qrcode id)
    members: HashMap<String, Vec<(i32, String)>>,
}

/// Non-durable [`QrStore`]. Every mutation runs under one write lock, which
/// makes get-or-create atomic within the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batch_count(&self) -> usize {
        self.inner.read().await.batches.len()
    }
}

#[async_trait]
impl QrStore for MemoryStore {
    async fn find_qrcode(&self, id: &str) -> StoreResult<Option<QrCodeRecord>> {
        Ok(self.inner.read().await.qrcodes.get(id).cloned())
    }

    async fn get_or_create_qrcode(
        &self,
        id: &str,
        url: &str,
    ) -> StoreResult<(QrCodeRecord, bool)> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.qrcodes.get(id) {
            return Ok((existing.clone(), false));
        }

        let record = QrCodeRecord {
            id: id.to_string(),
            url: url.to_string(),
            image_hash: None,
            image_size: None,
            created_at: Utc::now(),
        };
        inner.qrcodes.insert(id.to_string(), record.clone());
        Ok((record, true))
    }

    async fn attach_image(
        &self,
        id: &str,
        image_hash: &str,
        size: i64,
    ) -> StoreResult<QrCodeRecord> {
        let mut inner = self.inner.write().await;
        let record = inner
            .qrcodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("qrcode {id}")))?;
        if record.image_hash.is_none() {
            record.image_hash = Some(image_hash.to_string());
            record.image_size = Some(size);
        }
        Ok(record.clone())
    }

    async fn create_batch(&self, id: &str, members: &[(String, i32)]) -> StoreResult<BatchRecord> {
        let mut inner = self.inner.write().await;
        if let Some((missing, _)) = members.iter().find(|(q, _)| !inner.qrcodes.contains_key(q)) {
            return Err(StoreError::NotFound(format!("qrcode {missing}")));
        }

        let mut rows: Vec<(i32, String)> = Vec::with_capacity(members.len());
        for (qrcode_id, position) in members {
            if !rows.iter().any(|(_, id)| id == qrcode_id) {
                rows.push((*position, qrcode_id.clone()));
            }
        }

        let record = BatchRecord {
            id: id.to_string(),
            created_at: Utc::now(),
        };
        inner.batches.insert(id.to_string(), record.clone());
        inner.members.insert(id.to_string(), rows);
        Ok(record)
    }

    async fn find_batch(&self, id: &str) -> StoreResult<Option<BatchRecord>> {
        Ok(self.inner.read().await.batches.get(id).cloned())
    }

    async fn batch_members(&self, batch_id: &str) -> StoreResult<Vec<BatchMember>> {
        let inner = self.inner.read().await;
        let Some(members) = inner.members.get(batch_id) else {
            return Ok(Vec::new());
        };

        let mut out: Vec<BatchMember> = members
            .iter()
            .filter_map(|(position, id)| {
                inner.qrcodes.get(id).map(|qrcode| BatchMember {
                    position: *position,
                    qrcode: qrcode.clone(),
                })
            })
            .collect();
        out.sort_by_key(|m| m.position);
        Ok(out)
    }
}
