mod batch;
mod common;
mod qrcode;
