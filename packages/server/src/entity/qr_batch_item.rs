use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qr_batch_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub qrcode_id: String,
    #[sea_orm(belongs_to, from = "batch_id", to = "id")]
    pub batch: Option<super::qr_batch::Entity>,
    #[sea_orm(belongs_to, from = "qrcode_id", to = "id")]
    pub qrcode: Option<super::qrcode::Entity>,

    /// 0-based first-occurrence order within the upload.
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
