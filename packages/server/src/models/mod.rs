pub mod qrcode;
pub mod shared;
