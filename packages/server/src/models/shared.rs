use crate::config::ServerConfig;

/// Builds the links embedded in response bodies.
///
/// Links are absolute when `server.public_base_url` is set and root-relative
/// otherwise.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    pub fn new(server: &ServerConfig) -> Self {
        let base = server
            .public_base_url
            .as_deref()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();
        Self { base }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }

    pub fn qrcode_image(&self, id: &str) -> String {
        self.api(&format!("/qrcode/{id}/image"))
    }

    pub fn qrcode_download(&self, id: &str) -> String {
        self.api(&format!("/qrcode/{id}/download"))
    }

    pub fn batch_download(&self, id: &str) -> String {
        self.api(&format!("/qrcode/batch/{id}/download"))
    }
}
