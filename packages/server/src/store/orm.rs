use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use super::{BatchMember, BatchRecord, QrCodeRecord, QrStore, StoreError, StoreResult};
use crate::entity::{qr_batch, qr_batch_item, qrcode};

/// [`QrStore`] backed by a sea-orm connection.
#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<qrcode::Model> for QrCodeRecord {
    fn from(model: qrcode::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            image_hash: model.image_hash,
            image_size: model.image_size,
            created_at: model.created_at,
        }
    }
}

impl From<qr_batch::Model> for BatchRecord {
    fn from(model: qr_batch::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl QrStore for DbStore {
    async fn find_qrcode(&self, id: &str) -> StoreResult<Option<QrCodeRecord>> {
        Ok(qrcode::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn get_or_create_qrcode(
        &self,
        id: &str,
        url: &str,
    ) -> StoreResult<(QrCodeRecord, bool)> {
        if let Some(existing) = self.find_qrcode(id).await? {
            return Ok((existing, false));
        }

        let model = qrcode::ActiveModel {
            id: Set(id.to_string()),
            url: Set(url.to_string()),
            image_hash: Set(None),
            image_size: Set(None),
            created_at: Set(Utc::now()),
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok((inserted.into(), true)),
            // Another request created the row between our lookup and insert.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let existing = self.find_qrcode(id).await?.ok_or_else(|| {
                    StoreError::Database(DbErr::Custom(
                        "UniqueConstraintViolation but existing qrcode not found".to_string(),
                    ))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn attach_image(
        &self,
        id: &str,
        image_hash: &str,
        size: i64,
    ) -> StoreResult<QrCodeRecord> {
        qrcode::Entity::update_many()
            .col_expr(qrcode::Column::ImageHash, Expr::value(image_hash))
            .col_expr(qrcode::Column::ImageSize, Expr::value(size))
            .filter(qrcode::Column::Id.eq(id))
            .filter(qrcode::Column::ImageHash.is_null())
            .exec(&self.db)
            .await?;

        self.find_qrcode(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("qrcode {id}")))
    }

    async fn create_batch(&self, id: &str, members: &[(String, i32)]) -> StoreResult<BatchRecord> {
        let txn = self.db.begin().await?;

        let batch = qr_batch::ActiveModel {
            id: Set(id.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut seen = HashSet::new();
        let items: Vec<qr_batch_item::ActiveModel> = members
            .iter()
            .filter(|(qrcode_id, _)| seen.insert(qrcode_id.as_str()))
            .map(|(qrcode_id, position)| qr_batch_item::ActiveModel {
                batch_id: Set(id.to_string()),
                qrcode_id: Set(qrcode_id.clone()),
                position: Set(*position),
            })
            .collect();

        if !items.is_empty() {
            let ids: Vec<String> = members.iter().map(|(q, _)| q.clone()).collect();
            let known = qrcode::Entity::find()
                .filter(qrcode::Column::Id.is_in(ids))
                .count(&txn)
                .await?;
            if known != items.len() as u64 {
                txn.rollback().await?;
                return Err(StoreError::NotFound(format!("qrcode member of batch {id}")));
            }

            qr_batch_item::Entity::insert_many(items)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(batch.into())
    }

    async fn find_batch(&self, id: &str) -> StoreResult<Option<BatchRecord>> {
        Ok(qr_batch::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn batch_members(&self, batch_id: &str) -> StoreResult<Vec<BatchMember>> {
        let items = qr_batch_item::Entity::find()
            .filter(qr_batch_item::Column::BatchId.eq(batch_id))
            .order_by_asc(qr_batch_item::Column::Position)
            .all(&self.db)
            .await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = items.iter().map(|i| i.qrcode_id.clone()).collect();
        let mut qrcodes: HashMap<String, QrCodeRecord> = qrcode::Entity::find()
            .filter(qrcode::Column::Id.is_in(ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| (m.id.clone(), m.into()))
            .collect();

        Ok(items
            .into_iter()
            .filter_map(|item| {
                qrcodes.remove(&item.qrcode_id).map(|qrcode| BatchMember {
                    position: item.position,
                    qrcode,
                })
            })
            .collect())
    }
}
