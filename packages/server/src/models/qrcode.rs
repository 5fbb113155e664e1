use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::shared::LinkBuilder;
use crate::service::BatchItemError;
use crate::store::{BatchMember, BatchRecord, QrCodeRecord};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateQrCodeRequest {
    /// Target URL. `https://` is prepended when no scheme is given.
    #[schema(example = "google.com")]
    #[serde(default)]
    pub url: Option<String>,
}

/// Response DTO for a single QR code.
#[derive(Serialize, utoipa::ToSchema)]
pub struct QrCodeResponse {
    /// Deterministic identifier derived from the normalized URL.
    #[schema(example = "qrcode_c7b920f57e")]
    pub id: String,
    /// Normalized URL encoded in the image.
    #[schema(example = "https://google.com")]
    pub url: String,
    /// Link serving the PNG inline.
    pub qr_image_url: String,
    /// Link serving the PNG as an attachment.
    pub download_url: String,
    pub created_at: DateTime<Utc>,
}

/// A URL of an upload that did not produce a QR code.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BatchItemErrorResponse {
    /// 1-based spreadsheet data row, when the failure happened while reading the sheet.
    #[schema(example = 3)]
    pub row: Option<usize>,
    pub url: Option<String>,
    #[schema(example = "Row 3: Invalid URL - not a url")]
    pub message: String,
}

/// Response DTO for a batch.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BatchResponse {
    #[schema(example = "batch_1a2b3c4d")]
    pub id: String,
    /// Member QR codes in upload order.
    pub items: Vec<QrCodeResponse>,
    /// Link to the ZIP archive of all member images.
    pub zip_url: String,
    pub created_at: DateTime<Utc>,
    /// Rows and URLs that were skipped.
    pub errors: Vec<BatchItemErrorResponse>,
}

impl QrCodeResponse {
    pub fn new(record: QrCodeRecord, links: &LinkBuilder) -> Self {
        Self {
            qr_image_url: links.qrcode_image(&record.id),
            download_url: links.qrcode_download(&record.id),
            id: record.id,
            url: record.url,
            created_at: record.created_at,
        }
    }
}

impl From<BatchItemError> for BatchItemErrorResponse {
    fn from(err: BatchItemError) -> Self {
        Self {
            row: err.row,
            url: err.url,
            message: err.message,
        }
    }
}

impl BatchResponse {
    pub fn new(
        batch: BatchRecord,
        members: Vec<BatchMember>,
        errors: Vec<BatchItemError>,
        links: &LinkBuilder,
    ) -> Self {
        Self {
            zip_url: links.batch_download(&batch.id),
            id: batch.id,
            items: members
                .into_iter()
                .map(|m| QrCodeResponse::new(m.qrcode, links))
                .collect(),
            created_at: batch.created_at,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }
}
