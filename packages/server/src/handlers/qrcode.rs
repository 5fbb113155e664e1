use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::normalize_and_validate;
use common::spreadsheet::ingest_xlsx;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::qrcode::{BatchResponse, CreateQrCodeRequest, QrCodeResponse};
use crate::models::shared::LinkBuilder;
use crate::service::BatchItemError;
use crate::state::AppState;
use crate::utils::filename::{
    UploadNameError, batch_archive_name, content_disposition_value, qrcode_download_name,
    validate_spreadsheet_name,
};

pub fn batch_upload_body_limit(max_upload_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_size)
}

#[utoipa::path(
    post,
    path = "/qrcode",
    tag = "QR Codes",
    operation_id = "createQrCode",
    summary = "Create a QR code for a URL",
    description = "Normalizes the URL (`https://` is prepended when no scheme is given) and returns \
        the QR code for it, generating the image on first request. Repeated requests for the same \
        normalized URL return the same record.",
    request_body = CreateQrCodeRequest,
    responses(
        (status = 201, description = "QR code", body = QrCodeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_qrcode(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateQrCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let url = normalize_and_validate(payload.url.as_deref().unwrap_or_default())?;
    let record = state.qr.ensure_qrcode(&url).await?;

    let links = LinkBuilder::new(&state.config.server);
    Ok((
        StatusCode::CREATED,
        Json(QrCodeResponse::new(record, &links)),
    ))
}

#[utoipa::path(
    post,
    path = "/qrcode/batch",
    tag = "QR Code Batches",
    operation_id = "createQrCodeBatch",
    summary = "Create QR codes from a spreadsheet",
    description = "Reads URLs from the first worksheet of an `.xlsx` upload in the `file` field. \
        The URL column is found by header name, then by content, then falls back to the first \
        column. Rows that are not valid URLs and URLs that cannot be encoded are listed in \
        `errors`; the remaining URLs form the batch.",
    request_body(content_type = "multipart/form-data", description = "Spreadsheet upload"),
    responses(
        (status = 201, description = "Batch created", body = BatchResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Validation(UploadNameError::Missing.message().into()))?;
        let filename = validate_spreadsheet_name(&filename)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = upload
        .ok_or_else(|| AppError::Validation(UploadNameError::Missing.message().into()))?;

    let report = ingest_xlsx(&bytes)?;
    info!(
        %filename,
        urls = report.urls.len(),
        rejected = report.rejected.len(),
        column = report.column,
        strategy = ?report.strategy,
        "Spreadsheet read"
    );

    let mut errors: Vec<BatchItemError> = report
        .rejected
        .iter()
        .map(|r| BatchItemError {
            row: Some(r.row),
            url: Some(r.value.clone()),
            message: r.message(),
        })
        .collect();

    let outcome = state.qr.create_batch(&report.urls).await?;
    errors.extend(outcome.errors);

    let links = LinkBuilder::new(&state.config.server);
    Ok((
        StatusCode::CREATED,
        Json(BatchResponse::new(
            outcome.batch,
            outcome.members,
            errors,
            &links,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/qrcode/{id}",
    tag = "QR Codes",
    operation_id = "getQrCode",
    summary = "Get a QR code by ID",
    params(("id" = String, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "QR code", body = QrCodeResponse),
        (status = 404, description = "QR code not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_qrcode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QrCodeResponse>, AppError> {
    let record = state.qr.find_qrcode(&id).await?;
    let links = LinkBuilder::new(&state.config.server);
    Ok(Json(QrCodeResponse::new(record, &links)))
}

#[utoipa::path(
    get,
    path = "/qrcode/{id}/image",
    tag = "QR Codes",
    operation_id = "getQrCodeImage",
    summary = "Serve a QR code image inline",
    description = "Returns the PNG. Supports ETag-based caching via If-None-Match.",
    params(("id" = String, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "QR code or image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn get_qrcode_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    image_response(&state, &id, &headers, "inline").await
}

#[utoipa::path(
    get,
    path = "/qrcode/{id}/download",
    tag = "QR Codes",
    operation_id = "downloadQrCode",
    summary = "Download a QR code image",
    description = "Returns the PNG as an attachment named `{id}.png`.",
    params(("id" = String, Path, description = "QR code ID")),
    responses(
        (status = 200, description = "PNG attachment", content_type = "image/png"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "QR code or image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_qrcode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    image_response(&state, &id, &headers, "attachment").await
}

#[utoipa::path(
    get,
    path = "/qrcode/batch/{id}",
    tag = "QR Code Batches",
    operation_id = "getQrCodeBatch",
    summary = "Get a batch by ID",
    params(("id" = String, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch", body = BatchResponse),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchResponse>, AppError> {
    let (batch, members) = state.qr.find_batch(&id).await?;
    let links = LinkBuilder::new(&state.config.server);
    Ok(Json(BatchResponse::new(batch, members, Vec::new(), &links)))
}

#[utoipa::path(
    get,
    path = "/qrcode/batch/{id}/download",
    tag = "QR Code Batches",
    operation_id = "downloadQrCodeBatch",
    summary = "Download all images of a batch as a ZIP archive",
    description = "Entries are named `qr_NNN_<url>.png` in batch order. Members whose image \
        cannot be read are left out.",
    params(("id" = String, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "ZIP archive", content_type = "application/zip"),
        (status = 404, description = "Batch not found or empty (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Archive could not be built (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn download_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let archive = state.qr.batch_archive(&id).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(header::CONTENT_LENGTH, archive.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value("attachment", &batch_archive_name(&id)),
        )
        .body(Body::from(archive))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

async fn image_response(
    state: &AppState,
    id: &str,
    headers: &HeaderMap,
    disposition: &str,
) -> Result<Response, AppError> {
    let record = state.qr.find_qrcode(id).await?;

    let etag_value = record
        .image_hash
        .as_deref()
        .map(|hash| format!("\"{hash}\""));
    if let Some(etag) = &etag_value
        && let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let png = state
        .qr
        .load_image(&record)
        .await?
        .ok_or_else(|| AppError::NotFound("QR code image not found".into()))?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CONTENT_LENGTH, png.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(disposition, &qrcode_download_name(&record.id)),
        )
        .header(header::CACHE_CONTROL, "public, max-age=86400");
    if let Some(etag) = etag_value {
        builder = builder.header(header::ETAG, etag);
    }

    builder
        .body(Body::from(png))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
