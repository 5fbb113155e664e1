use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qr_batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many, via = "qr_batch_item")]
    pub qrcodes: HasMany<super::qrcode::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
