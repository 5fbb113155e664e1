pub mod health;
pub mod qrcode;
