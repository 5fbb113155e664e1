use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::QrImageBuilder;
use common::storage::filesystem::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrcode_server::config::AppConfig;
use qrcode_server::database::init_db;
use qrcode_server::service::QrService;
use qrcode_server::state::AppState;
use qrcode_server::store::DbStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database)
        .await
        .context("Failed to initialize database")?;
    let blobs = FilesystemBlobStore::new(
        config.storage.blob_dir.clone(),
        config.storage.max_blob_size,
    )
    .await
    .context("Failed to initialize blob store")?;
    info!(dir = %config.storage.blob_dir.display(), "Blob store ready");

    let service = QrService::new(
        Arc::new(DbStore::new(db)),
        Arc::new(blobs),
        QrImageBuilder::new(config.qr),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let app = qrcode_server::build_router(AppState::new(config, service));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
