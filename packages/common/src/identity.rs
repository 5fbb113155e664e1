use md5::{Digest, Md5};

/// Namespace tag prepended to every QR code identifier.
pub const QRCODE_ID_PREFIX: &str = "qrcode_";

/// Namespace tag prepended to every batch identifier.
pub const BATCH_ID_PREFIX: &str = "batch_";

/// Number of hex characters of the URL digest kept in the identifier.
const QRCODE_HASH_LEN: usize = 10;

/// Number of random characters kept in a batch identifier.
const BATCH_RANDOM_LEN: usize = 8;

/// Derive the stable identifier of a normalized URL.
///
/// The identifier is a pure function of the URL bytes, so repeated requests for
/// the same URL resolve to the same record across process restarts.
pub fn qrcode_id(normalized_url: &str) -> String {
    let digest = hex::encode(Md5::digest(normalized_url.as_bytes()));
    format!("{QRCODE_ID_PREFIX}{}", &digest[..QRCODE_HASH_LEN])
}

/// Generate a fresh random batch identifier.
pub fn new_batch_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("{BATCH_ID_PREFIX}{}", &uuid[..BATCH_RANDOM_LEN])
}
