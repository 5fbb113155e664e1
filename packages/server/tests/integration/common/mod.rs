use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ::common::QrImageBuilder;
use ::common::storage::memory::MemoryBlobStore;
use reqwest::Client;
use rust_xlsxwriter::Workbook;
use serde_json::Value;

use qrcode_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig, UploadConfig,
};
use qrcode_server::service::QrService;
use qrcode_server::state::AppState;
use qrcode_server::store::MemoryStore;

pub mod routes {
    pub const HEALTH: &str = "/api/v1/health";
    pub const QRCODE: &str = "/api/v1/qrcode";
    pub const BATCH: &str = "/api/v1/qrcode/batch";

    pub fn qrcode(id: &str) -> String {
        format!("/api/v1/qrcode/{id}")
    }

    pub fn qrcode_image(id: &str) -> String {
        format!("/api/v1/qrcode/{id}/image")
    }

    pub fn qrcode_download(id: &str) -> String {
        format!("/api/v1/qrcode/{id}/download")
    }

    pub fn batch(id: &str) -> String {
        format!("/api/v1/qrcode/batch/{id}")
    }

    pub fn batch_download(id: &str) -> String {
        format!("/api/v1/qrcode/batch/{id}/download")
    }
}

/// A running test server backed by in-memory stores.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Raw HTTP response for binary downloads.
pub struct BinaryResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

fn test_config(public_base_url: Option<&str>) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_base_url: public_base_url.map(str::to_string),
            cors: CorsConfig::default(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        storage: StorageConfig {
            blob_dir: PathBuf::from("unused"),
            max_blob_size: 10 * 1024 * 1024,
        },
        upload: UploadConfig {
            max_upload_size: 1024 * 1024,
        },
        qr: Default::default(),
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_base_url(None).await
    }

    pub async fn spawn_with_base_url(public_base_url: Option<&str>) -> Self {
        let config = test_config(public_base_url);
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = QrService::new(
            Arc::new(MemoryStore::new()),
            blobs.clone(),
            QrImageBuilder::new(config.qr),
        );

        let app = qrcode_server::build_router(AppState::new(config, service));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            blobs,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_bytes(&self, path: &str) -> BinaryResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        let header = |name: reqwest::header::HeaderName| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = res.status().as_u16();
        let content_type = header(reqwest::header::CONTENT_TYPE);
        let content_disposition = header(reqwest::header::CONTENT_DISPOSITION);
        let bytes = res.bytes().await.unwrap_or_default().to_vec();

        BinaryResponse {
            status,
            content_type,
            content_disposition,
            bytes,
        }
    }

    pub async fn upload(&self, file_name: &str, file_bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(routes::BATCH))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Create a QR code via the API and return its `id`.
    pub async fn create_qrcode(&self, url: &str) -> String {
        let res = self
            .post_json(routes::QRCODE, &serde_json::json!({ "url": url }))
            .await;
        assert_eq!(res.status, 201, "create_qrcode failed: {}", res.text);
        res.id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }
}

/// Build a single-sheet workbook; empty strings leave the cell blank.
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Decode the single QR symbol in a PNG.
pub fn decode_qr(png: &[u8]) -> String {
    let img = image::load_from_memory(png).unwrap().to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    grids[0].decode().unwrap().1
}

/// Entries of a ZIP archive as `(name, bytes)` in archive order.
pub fn unzip(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}
