pub mod qr_batch;
pub mod qr_batch_item;
pub mod qrcode;
