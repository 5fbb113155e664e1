use std::fmt;

use sha2::{Digest, Sha256};

use super::error::StorageError;

/// SHA-256 digest identifying a stored image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Parse the 64-character hex form persisted on QR code records.
    pub fn from_hex(s: &str) -> Result<Self, StorageError> {
        let bytes =
            hex::decode(s).map_err(|e| StorageError::InvalidHash(format!("invalid hex: {e}")))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            StorageError::InvalidHash(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Relative path of the blob: `{first 2 hex chars}/{remaining 62}.png`.
    pub fn relative_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}.png", &hex[..2], &hex[2..])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
