use std::path::PathBuf;

use common::QrImageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty disables the CORS layer.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin prepended to links in response bodies, e.g. `https://qr.example.com`.
    /// Links are root-relative when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Pool size; must be 1 for `sqlite::memory:` so every query sees the same database.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding generated PNG images.
    pub blob_dir: PathBuf,
    /// Maximum size of a single stored image in bytes.
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Maximum accepted spreadsheet upload in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub qr: QrImageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite://qrcodes.db?mode=rwc")?
            .set_default("storage.blob_dir", "./media/qrcodes")?
            .set_default("storage.max_blob_size", 10 * 1024 * 1024)?
            .set_default("upload.max_upload_size", 16 * 1024 * 1024)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., QRCODE__DATABASE__URL)
            .add_source(Environment::with_prefix("QRCODE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
