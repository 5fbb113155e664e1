pub mod archive;
pub mod identity;
pub mod qr_image;
pub mod spreadsheet;
pub mod storage;
pub mod url;

pub use identity::{new_batch_id, qrcode_id};
pub use qr_image::{QrImageBuilder, QrImageConfig, QrImageError};
pub use url::{normalize_url, normalize_and_validate};
