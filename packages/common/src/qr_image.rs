use std::io::Cursor;

use image::{GrayImage, ImageFormat, Luma, imageops};
use qrcode::{EcLevel, QrCode};
use serde::Deserialize;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Errors raised while turning a URL into a PNG.
#[derive(Debug, thiserror::Error)]
pub enum QrImageError {
    /// The encoder rejected the payload (e.g. too long for any symbol version).
    #[error("Cannot create QR code for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: qrcode::types::QrError,
    },
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Rendering parameters for generated symbols.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QrImageConfig {
    /// Pixel width and height of a single module.
    #[serde(default = "default_module_size")]
    pub module_size: u32,
    /// Quiet zone width, in modules.
    #[serde(default = "default_border")]
    pub border: u32,
}

fn default_module_size() -> u32 {
    10
}
fn default_border() -> u32 {
    4
}

impl Default for QrImageConfig {
    fn default() -> Self {
        Self {
            module_size: default_module_size(),
            border: default_border(),
        }
    }
}

/// Renders URLs as black-on-white QR code PNGs with error-correction level L
/// and the smallest symbol version that fits.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrImageBuilder {
    config: QrImageConfig,
}

impl QrImageBuilder {
    pub fn new(config: QrImageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> QrImageConfig {
        self.config
    }

    /// Render the symbol for `url` as a grayscale raster.
    pub fn render(&self, url: &str) -> Result<GrayImage, QrImageError> {
        let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::L).map_err(
            |source| QrImageError::Encode {
                url: url.to_string(),
                source,
            },
        )?;

        let module = self.config.module_size.max(1);
        let symbol = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(module, module)
            .dark_color(DARK)
            .light_color(LIGHT)
            .build();

        let pad = self.config.border * module;
        let mut canvas =
            GrayImage::from_pixel(symbol.width() + 2 * pad, symbol.height() + 2 * pad, LIGHT);
        imageops::replace(&mut canvas, &symbol, i64::from(pad), i64::from(pad));
        Ok(canvas)
    }

    /// Render the symbol for `url` and encode it as PNG bytes.
    pub fn build_png(&self, url: &str) -> Result<Vec<u8>, QrImageError> {
        let image = self.render(url)?;
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}
