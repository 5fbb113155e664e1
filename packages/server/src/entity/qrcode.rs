use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qrcode")]
pub struct Model {
    /// `qrcode_` + 10 hex characters of the URL digest.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Normalized URL encoded in the symbol.
    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// SHA-256 of the stored PNG; `None` until the image is attached.
    pub image_hash: Option<String>,

    pub image_size: Option<i64>,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many, via = "qr_batch_item")]
    pub batches: HasMany<super::qr_batch::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
