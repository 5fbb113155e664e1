use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::QrService;

#[derive(Clone)]
pub struct AppState {
    pub qr: Arc<QrService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, qr: QrService) -> Self {
        Self {
            qr: Arc::new(qr),
            config,
        }
    }
}
